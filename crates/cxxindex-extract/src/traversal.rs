//! Syntax-tree traversal and entity extraction.
//!
//! Walks the parsed tree under an explicit namespace-context stack,
//! dispatching on node kind: namespaces push a qualifier segment, linkage
//! specifications and preprocessor conditionals are transparent, template
//! declarations mark their inner entity and become its outer node.
//! Error nodes are data, not control flow: entities inside damaged regions
//! are still emitted whenever their name can be canonicalized.

use std::collections::HashMap;

use cxxindex_core::{
    create_global_uri, make_signature_hash, EntityType, ExtractOptions, ExtractedEntity,
};
use tree_sitter::{Node, Tree};

use crate::comment::docstring_for;
use crate::names::{class_name, declaration_function_name, function_name, namespace_name, qualify};

/// Node kinds extracted as standalone entities.
const TARGET_ENTITY_KINDS: [&str; 3] =
    ["class_specifier", "struct_specifier", "function_definition"];

/// Container kinds whose children are scanned for entities. Error nodes
/// are containers too: entities inside a damaged region are still emitted
/// when their name can be canonicalized.
const CONTAINER_KINDS: [&str; 4] = [
    "translation_unit",
    "declaration_list",
    "field_declaration_list",
    "ERROR",
];

/// Preprocessor conditionals traversed as transparent containers.
const PREPROCESSOR_CONTAINERS: [&str; 5] = [
    "preproc_ifdef",
    "preproc_ifndef",
    "preproc_if",
    "preproc_elif",
    "preproc_else",
];

const TEMPLATE_WRAPPER: &str = "template_declaration";
const NAMESPACE_NODE: &str = "namespace_definition";
const LINKAGE_NODE: &str = "linkage_specification";
const DECLARATION_NODE: &str = "declaration";

fn is_target_kind(kind: &str) -> bool {
    TARGET_ENTITY_KINDS.contains(&kind)
}

fn node_text_lossy(node: Node, source: &[u8]) -> String {
    String::from_utf8_lossy(&source[node.byte_range()]).into_owned()
}

/// Walk up from an entity node to its outermost wrapping template
/// declaration, if any.
///
/// The returned node is used uniformly for doc-comment search, byte range,
/// and line range, so a templated entity's record covers its
/// `template<...>` prefix.
fn effective_outer_node(node: Node) -> (Node, bool) {
    let mut outer = node;
    let mut is_templated = false;
    while let Some(parent) = outer.parent() {
        if parent.kind() != TEMPLATE_WRAPPER {
            break;
        }
        outer = parent;
        is_templated = true;
    }
    (outer, is_templated)
}

/// Whether a `function_definition` node carries a body.
///
/// Prototypes misparsed into `function_definition` (and definitions inside
/// damaged regions) may lack one.
fn has_body(node: Node) -> bool {
    node.child_by_field_name("body").is_some()
}

/// Detect a class/struct misparsed as `function_definition` by an
/// interposed macro, e.g. `class RTC_EXPORT Name { ... };`.
///
/// The declarator text is the entity name in that shape.
fn detect_macro_broken_class(node: Node, source: &[u8]) -> Option<(EntityType, String)> {
    if node.kind() != "function_definition" {
        return None;
    }
    let text = node_text_lossy(node, source);
    let stripped = text.trim_start();
    let entity_type = if stripped.starts_with("class ") {
        EntityType::Class
    } else if stripped.starts_with("struct ") {
        EntityType::Struct
    } else {
        return None;
    };
    let declarator = node.child_by_field_name("declarator")?;
    let name = cxxindex_core::normalize_entity_name(&node_text_lossy(declarator, source));
    if name.is_empty() {
        return None;
    }
    tracing::info!(
        "Detected macro-broken {} '{}' at line {}",
        entity_type,
        name,
        node.start_position().row + 1
    );
    Some((entity_type, name))
}

fn build_entity(
    outer: Node,
    is_templated: bool,
    entity_type: EntityType,
    qualified_name: String,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    options: &ExtractOptions,
) -> ExtractedEntity {
    let docstring = docstring_for(outer, source, options);
    let code_text = node_text_lossy(outer, source);
    let global_uri = create_global_uri(repo_name, file_path, entity_type, &qualified_name, None);

    ExtractedEntity {
        global_uri,
        repo_name: repo_name.to_string(),
        file_path: file_path.to_string(),
        entity_type,
        entity_name: qualified_name,
        docstring,
        code_text,
        start_line: outer.start_position().row + 1,
        end_line: outer.end_position().row + 1,
        is_templated,
    }
}

/// Extract a single entity (class/struct/function) from a target node.
///
/// Returns `None` for forward declarations, prototypes, anonymous
/// classes/structs, and declarators without a canonicalizable name.
fn extract_entity_from_node(
    node: Node,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    namespace_stack: &[String],
    options: &ExtractOptions,
) -> Option<ExtractedEntity> {
    if !is_target_kind(node.kind()) {
        return None;
    }

    let (entity_type, entity_name) = if let Some(broken) = detect_macro_broken_class(node, source) {
        broken
    } else {
        match node.kind() {
            "function_definition" => {
                if !has_body(node) {
                    tracing::debug!(
                        "Skipping function declaration at line {}",
                        node.start_position().row + 1
                    );
                    return None;
                }
                (EntityType::Function, function_name(node, source)?)
            }
            "class_specifier" | "struct_specifier" => {
                if node.child_by_field_name("body").is_none() {
                    tracing::debug!(
                        "Skipping forward declaration at line {}",
                        node.start_position().row + 1
                    );
                    return None;
                }
                let entity_type = if node.kind() == "class_specifier" {
                    EntityType::Class
                } else {
                    EntityType::Struct
                };
                (entity_type, class_name(node, source)?)
            }
            _ => return None,
        }
    };

    let qualified_name = qualify(namespace_stack, &entity_name);
    if qualified_name.is_empty() {
        return None;
    }

    let (outer, is_templated) = effective_outer_node(node);
    let entity = build_entity(
        outer,
        is_templated,
        entity_type,
        qualified_name,
        source,
        repo_name,
        file_path,
        options,
    );
    tracing::debug!(
        "Extracted {}: {} at {}:{}",
        entity.entity_type,
        entity.entity_name,
        entity.file_path,
        entity.start_line
    );
    Some(entity)
}

fn should_extract_declaration(options: &ExtractOptions, extern_context: bool) -> bool {
    options.include_declarations || (extern_context && options.extern_c_declarations)
}

/// Extract a declaration-only function prototype as an entity.
fn extract_declaration_entity(
    node: Node,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    namespace_stack: &[String],
    options: &ExtractOptions,
) -> Option<ExtractedEntity> {
    let name = declaration_function_name(node, source)?;
    let qualified_name = qualify(namespace_stack, &name);
    if qualified_name.is_empty() {
        return None;
    }
    let (outer, is_templated) = effective_outer_node(node);
    Some(build_entity(
        outer,
        is_templated,
        EntityType::Function,
        qualified_name,
        source,
        repo_name,
        file_path,
        options,
    ))
}

fn handle_template(
    template: Node,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    namespace_stack: &[String],
    extern_context: bool,
    options: &ExtractOptions,
    entities: &mut Vec<ExtractedEntity>,
) {
    let mut cursor = template.walk();
    for child in template.named_children(&mut cursor) {
        if is_target_kind(child.kind()) {
            if let Some(entity) = extract_entity_from_node(
                child,
                source,
                repo_name,
                file_path,
                namespace_stack,
                options,
            ) {
                entities.push(entity);
            }
            break;
        }
        if child.kind() == DECLARATION_NODE {
            // A template can wrap a declaration holding the specifier, or a
            // templated function prototype.
            if let Some(type_node) = child.child_by_field_name("type") {
                if is_target_kind(type_node.kind()) {
                    if let Some(entity) = extract_entity_from_node(
                        type_node,
                        source,
                        repo_name,
                        file_path,
                        namespace_stack,
                        options,
                    ) {
                        entities.push(entity);
                    }
                    break;
                }
            }
            if should_extract_declaration(options, extern_context) {
                if let Some(entity) = extract_declaration_entity(
                    child,
                    source,
                    repo_name,
                    file_path,
                    namespace_stack,
                    options,
                ) {
                    entities.push(entity);
                    break;
                }
            }
        }
    }
}

fn traverse(
    node: Node,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    namespace_stack: &[String],
    extern_context: bool,
    options: &ExtractOptions,
    entities: &mut Vec<ExtractedEntity>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let kind = child.kind();

        if kind == TEMPLATE_WRAPPER {
            handle_template(
                child,
                source,
                repo_name,
                file_path,
                namespace_stack,
                extern_context,
                options,
                entities,
            );
        } else if kind == NAMESPACE_NODE {
            let mut new_stack = namespace_stack.to_vec();
            if let Some(name) = namespace_name(child, source) {
                new_stack.push(name);
            }
            if let Some(body) = child.child_by_field_name("body") {
                traverse(
                    body,
                    source,
                    repo_name,
                    file_path,
                    &new_stack,
                    extern_context,
                    options,
                    entities,
                );
            }
        } else if kind == DECLARATION_NODE {
            // Classes/structs are frequently wrapped in a declaration.
            let type_node = child.child_by_field_name("type");
            if let Some(type_node) = type_node.filter(|n| is_target_kind(n.kind())) {
                if let Some(entity) = extract_entity_from_node(
                    type_node,
                    source,
                    repo_name,
                    file_path,
                    namespace_stack,
                    options,
                ) {
                    entities.push(entity);
                }
            } else if should_extract_declaration(options, extern_context) {
                if let Some(entity) = extract_declaration_entity(
                    child,
                    source,
                    repo_name,
                    file_path,
                    namespace_stack,
                    options,
                ) {
                    entities.push(entity);
                }
            }
        } else if is_target_kind(kind) {
            if let Some(entity) = extract_entity_from_node(
                child,
                source,
                repo_name,
                file_path,
                namespace_stack,
                options,
            ) {
                entities.push(entity);
            }
        } else if kind == LINKAGE_NODE {
            // extern "C" { ... } is transparent: no qualifier segment.
            if let Some(body) = child.child_by_field_name("body") {
                traverse(
                    body,
                    source,
                    repo_name,
                    file_path,
                    namespace_stack,
                    true,
                    options,
                    entities,
                );
            }
        } else if PREPROCESSOR_CONTAINERS.contains(&kind) {
            traverse(
                child,
                source,
                repo_name,
                file_path,
                namespace_stack,
                extern_context,
                options,
                entities,
            );
        } else if CONTAINER_KINDS.contains(&kind) {
            traverse(
                child,
                source,
                repo_name,
                file_path,
                namespace_stack,
                extern_context,
                options,
                entities,
            );
        }
    }
}

/// Derive a stable signature source from function code text: everything up
/// to the first `{` or `;`, whitespace collapsed.
fn signature_source(code_text: &str) -> String {
    let text = code_text.trim();
    let cut = match (text.find('{'), text.find(';')) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    let head = cut.map_or(text, |idx| &text[..idx]);
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append signature-hash tokens to the URIs of same-name function
/// overloads, keeping them collision-free within one file.
///
/// Only runs under `disambiguate_overloads`; the default contract leaves
/// overload URIs identical.
fn disambiguate_overloaded_uris(entities: &mut [ExtractedEntity]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, entity) in entities.iter().enumerate() {
        if entity.entity_type != EntityType::Function {
            continue;
        }
        groups.entry(entity.global_uri.clone()).or_default().push(idx);
    }

    for indices in groups.values() {
        if indices.len() <= 1 {
            continue;
        }
        tracing::info!(
            "Detected {} overload candidates for function '{}' in {}",
            indices.len(),
            entities[indices[0]].entity_name,
            entities[indices[0]].file_path,
        );

        let mut seen: HashMap<String, usize> = HashMap::new();
        for &idx in indices {
            let sig = signature_source(&entities[idx].code_text);
            let mut token = make_signature_hash(&sig);
            let mut uri = create_global_uri(
                &entities[idx].repo_name,
                &entities[idx].file_path,
                entities[idx].entity_type,
                &entities[idx].entity_name,
                Some(&token),
            );
            // Declaration+definition pairs can share a signature; salt the
            // residual collisions deterministically by ordinal.
            let duplicates = seen.entry(uri.clone()).or_insert(0);
            if *duplicates > 0 {
                token = make_signature_hash(&format!("{sig}|duplicate:{duplicates}"));
                uri = create_global_uri(
                    &entities[idx].repo_name,
                    &entities[idx].file_path,
                    entities[idx].entity_type,
                    &entities[idx].entity_name,
                    Some(&token),
                );
            }
            *duplicates += 1;
            entities[idx].global_uri = uri;
        }
    }
}

/// Extract all entities from a parsed C++ tree, in source order.
///
/// This is the per-file entry point: the directory walker calls it once
/// per parsed file.
pub fn extract_entities_from_tree(
    tree: &Tree,
    source: &[u8],
    repo_name: &str,
    file_path: &str,
    options: &ExtractOptions,
) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();
    traverse(
        tree.root_node(),
        source,
        repo_name,
        file_path,
        &[],
        false,
        options,
        &mut entities,
    );
    if options.disambiguate_overloads {
        disambiguate_overloaded_uris(&mut entities);
    }
    tracing::debug!("Extracted {} entities from {}", entities.len(), file_path);
    entities
}
