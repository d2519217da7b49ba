//! Canonical entity names from declarator subtrees.
//!
//! One recursive descent handles the whole declarator surface: plain and
//! qualified identifiers, destructors, overloaded operators, conversion
//! operators, and in-class method definitions. Qualified identifiers keep
//! their `::`-separated source form verbatim.

use cxxindex_core::normalize_entity_name;
use tree_sitter::Node;

fn node_text(node: Node, source: &[u8]) -> String {
    String::from_utf8_lossy(&source[node.byte_range()]).into_owned()
}

/// Normalize an operator name to its canonical spacing.
///
/// Symbol operators lose internal spaces (`operator ==` -> `operator==`,
/// `operator [ ]` -> `operator[]`); word operators keep the single keyword
/// space (`operator new`, `operator delete[]`).
fn normalize_operator_name(raw: &str) -> String {
    let collapsed = normalize_entity_name(raw);
    let Some(rest) = collapsed.strip_prefix("operator") else {
        return collapsed;
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return "operator".to_string();
    }
    if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        let compact = rest.replace(" [", "[").replace(" (", "(");
        format!("operator {compact}")
    } else {
        let compact: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
        format!("operator{compact}")
    }
}

/// Descend a declarator subtree to its innermost name-bearing node.
///
/// Returns the canonical name, or `None` when the declarator carries no
/// usable name (the entity is then dropped).
pub fn declarator_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "function_declarator" | "pointer_declarator" | "reference_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            declarator_name(inner, source)
        }
        "parenthesized_declarator" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next()?;
            declarator_name(inner, source)
        }
        "qualified_identifier" => {
            // Keep the scoped form verbatim; spacing is canonicalized.
            Some(normalize_entity_name(&node_text(node, source)))
        }
        "identifier" | "field_identifier" | "type_identifier" | "destructor_name" => {
            Some(normalize_entity_name(&node_text(node, source)))
        }
        "operator_name" => Some(normalize_operator_name(&node_text(node, source))),
        "operator_cast" => {
            // Conversion operator: `operator` + target type source slice.
            let type_node = node.child_by_field_name("type")?;
            Some(normalize_entity_name(&format!(
                "operator {}",
                node_text(type_node, source)
            )))
        }
        _ => {
            // Unrecognized declarator shape: salvage the text up to the
            // parameter list, as the grammar occasionally wraps names in
            // kinds not listed above.
            let text = node_text(node, source);
            let head = text.split('(').next().unwrap_or(&text);
            let name = normalize_entity_name(head);
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }
}

/// Extract the canonical name from a `function_definition` node.
pub fn function_name(node: Node, source: &[u8]) -> Option<String> {
    let declarator = node.child_by_field_name("declarator");
    let Some(declarator) = declarator else {
        tracing::debug!(
            "Function at line {} has no declarator",
            node.start_position().row + 1
        );
        return None;
    };
    declarator_name(declarator, source).filter(|name| !name.is_empty())
}

/// Extract the name from a `class_specifier` or `struct_specifier` node.
///
/// Anonymous classes/structs have no `name` field and yield `None`.
pub fn class_name(node: Node, source: &[u8]) -> Option<String> {
    match node.child_by_field_name("name") {
        Some(name_node) => {
            let name = normalize_entity_name(&node_text(name_node, source));
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
        None => {
            tracing::debug!(
                "Class at line {} has no name (anonymous)",
                node.start_position().row + 1
            );
            None
        }
    }
}

/// Extract the name from a `namespace_definition` node.
///
/// Anonymous namespaces yield `None` and contribute no qualifier segment.
pub fn namespace_name(node: Node, source: &[u8]) -> Option<String> {
    let name_node = node.child_by_field_name("name")?;
    let name = normalize_entity_name(&node_text(name_node, source));
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Extract a function name from a `declaration` node holding a prototype.
///
/// Returns `None` when the declaration is not a function prototype.
pub fn declaration_function_name(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "declaration" {
        return None;
    }
    let declarator = node.child_by_field_name("declarator")?;

    if declarator.kind() == "function_declarator" {
        let name_node = declarator.child_by_field_name("declarator")?;
        return declarator_name(name_node, source);
    }

    // Some forms are wrapped one level deeper (e.g. pointer returns).
    let inner = declarator.child_by_field_name("declarator")?;
    if inner.kind() == "function_declarator" {
        let name_node = inner.child_by_field_name("declarator")?;
        return declarator_name(name_node, source);
    }

    None
}

/// Prepend the active namespace stack to a canonical name.
pub fn qualify(namespace_stack: &[String], name: &str) -> String {
    if namespace_stack.is_empty() {
        normalize_entity_name(name)
    } else {
        normalize_entity_name(&format!("{}::{}", namespace_stack.join("::"), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CppParser;
    use tree_sitter::Tree;

    fn parse(source: &[u8]) -> Tree {
        CppParser::new().unwrap().parse_bytes(source).unwrap()
    }

    fn find_kind<'t>(tree: &'t Tree, kind: &str) -> Node<'t> {
        fn walk<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
            if node.kind() == kind {
                return Some(node);
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if let Some(found) = walk(child, kind) {
                    return Some(found);
                }
            }
            None
        }
        walk(tree.root_node(), kind).unwrap_or_else(|| panic!("no {kind} node in fixture"))
    }

    #[test]
    fn simple_function_name() {
        let source = b"void foo() {}";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("foo"));
    }

    #[test]
    fn function_name_with_params() {
        let source = b"int add(int a, int b) { return a + b; }";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("add"));
    }

    #[test]
    fn pointer_return_descends_to_identifier() {
        let source = b"int* make_buffer(int n) { return 0; }";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("make_buffer"));
    }

    #[test]
    fn qualified_name_is_kept_verbatim() {
        let source = b"void Server::start() {}";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("Server::start"));
    }

    #[test]
    fn destructor_name_keeps_tilde() {
        let source = b"Server::~Server() {}";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(
            function_name(node, source).as_deref(),
            Some("Server::~Server")
        );
    }

    #[test]
    fn operator_name_loses_internal_spaces() {
        let source = b"bool operator == (const P& a, const P& b) { return true; }";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("operator=="));
    }

    #[test]
    fn subscript_operator_is_compact() {
        let source = b"struct V { int operator [] (int i) { return i; } };";
        let tree = parse(source);
        let node = find_kind(&tree, "function_definition");
        assert_eq!(function_name(node, source).as_deref(), Some("operator[]"));
    }

    #[test]
    fn word_operator_keeps_keyword_space() {
        assert_eq!(normalize_operator_name("operator  new"), "operator new");
        assert_eq!(normalize_operator_name("operator new []"), "operator new[]");
        assert_eq!(normalize_operator_name("operator=="), "operator==");
    }

    #[test]
    fn class_and_struct_names() {
        let source = b"class MyClass {}; struct Point { int x; };";
        let tree = parse(source);
        let class_node = find_kind(&tree, "class_specifier");
        assert_eq!(class_name(class_node, source).as_deref(), Some("MyClass"));
        let struct_node = find_kind(&tree, "struct_specifier");
        assert_eq!(class_name(struct_node, source).as_deref(), Some("Point"));
    }

    #[test]
    fn anonymous_struct_has_no_name() {
        let source = b"struct { int x; } value;";
        let tree = parse(source);
        let node = find_kind(&tree, "struct_specifier");
        assert_eq!(class_name(node, source), None);
    }

    #[test]
    fn namespace_names() {
        let source = b"namespace foo {}";
        let tree = parse(source);
        let node = find_kind(&tree, "namespace_definition");
        assert_eq!(namespace_name(node, source).as_deref(), Some("foo"));

        let anon = b"namespace { void f() {} }";
        let anon_tree = parse(anon);
        let anon_node = find_kind(&anon_tree, "namespace_definition");
        assert_eq!(namespace_name(anon_node, anon), None);
    }

    #[test]
    fn prototype_name_from_declaration() {
        let source = b"void proto_only(int x);";
        let tree = parse(source);
        let node = find_kind(&tree, "declaration");
        assert_eq!(
            declaration_function_name(node, source).as_deref(),
            Some("proto_only")
        );
    }

    #[test]
    fn variable_declaration_is_not_a_prototype() {
        let source = b"int value = 3;";
        let tree = parse(source);
        let node = find_kind(&tree, "declaration");
        assert_eq!(declaration_function_name(node, source), None);
    }

    #[test]
    fn qualify_joins_with_scope_separator() {
        let stack = vec!["outer".to_string(), "inner".to_string()];
        assert_eq!(qualify(&stack, "Name"), "outer::inner::Name");
        assert_eq!(qualify(&[], "Name"), "Name");
    }
}
