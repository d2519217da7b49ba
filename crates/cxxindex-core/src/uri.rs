//! Global URI contract shared by the structural extractor and any
//! downstream indexing layer.
//!
//! The URI is the join key between independent stores, so every rule here
//! is part of the identity contract: two layers that both follow this
//! module produce byte-identical URIs for the same entity.

use sha2::{Digest, Sha256};

use crate::EntityType;
use crate::IndexError;

/// Separator between Global URI segments (and C++ scope segments).
pub const GLOBAL_URI_SEPARATOR: &str = "::";

/// Components of a parsed Global URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGlobalUri {
    pub repo_name: String,
    pub file_path: String,
    pub entity_type: String,
    pub entity_name: String,
    /// Present only on Function URIs carrying an overload discriminator.
    pub signature_hash: Option<String>,
}

/// Normalize a C++ entity name into its canonical, URI-safe form.
///
/// Collapses whitespace runs to a single space and tightens spacing around
/// scope separators so trivially different parser outputs agree:
/// `Server ::~Server` becomes `Server::~Server`.
pub fn normalize_entity_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" ::", "::").replace(":: ", "::")
}

/// Build a Global URI from already-normalized components.
///
/// The join is literal concatenation with `::`; nothing is escaped. File
/// paths use `/` and entity names use `::` internally, which is acceptable
/// because the first two segments are positional.
pub fn create_global_uri(
    repo_name: &str,
    file_path: &str,
    entity_type: EntityType,
    entity_name: &str,
    signature_hash: Option<&str>,
) -> String {
    let canonical = normalize_entity_name(entity_name);
    let mut uri = format!(
        "{repo_name}{sep}{file_path}{sep}{entity_type}{sep}{canonical}",
        sep = GLOBAL_URI_SEPARATOR,
    );
    if entity_type == EntityType::Function {
        if let Some(token) = signature_hash {
            uri.push_str(GLOBAL_URI_SEPARATOR);
            uri.push_str(token);
        }
    }
    uri
}

/// Create a stable short token for function-signature disambiguation.
///
/// The token is `sig_` followed by the first 12 hex characters of the
/// SHA-256 digest of the whitespace-normalized signature source.
pub fn make_signature_hash(signature_source: &str) -> String {
    let canonical = normalize_entity_name(signature_source);
    let canonical = if canonical.is_empty() {
        "<empty-signature>"
    } else {
        canonical.as_str()
    };
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sig_{}", &hex[..12])
}

fn is_signature_token(segment: &str) -> bool {
    segment
        .strip_prefix("sig_")
        .is_some_and(|hex| {
            (8..=40).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        })
}

/// Parse a Global URI back into its components.
///
/// Trailing segments beyond the entity type are rejoined into the entity
/// name, since qualified names contain `::` themselves. A trailing
/// `sig_<hex>` token on a Function URI is split off as the signature hash.
pub fn parse_global_uri(global_uri: &str) -> Result<ParsedGlobalUri, IndexError> {
    let parts: Vec<&str> = global_uri.split(GLOBAL_URI_SEPARATOR).collect();
    if parts.len() < 4 {
        return Err(IndexError::InvalidInput(format!(
            "Malformed Global URI: {global_uri}"
        )));
    }

    let entity_type = parts[2].to_string();
    let mut name_parts = &parts[3..];
    let mut signature_hash = None;
    if entity_type == "Function" && parts.len() >= 5 && is_signature_token(parts[parts.len() - 1]) {
        signature_hash = Some(parts[parts.len() - 1].to_string());
        name_parts = &parts[3..parts.len() - 1];
    }

    Ok(ParsedGlobalUri {
        repo_name: parts[0].to_string(),
        file_path: parts[1].to_string(),
        entity_type,
        entity_name: name_parts.join(GLOBAL_URI_SEPARATOR),
        signature_hash,
    })
}
