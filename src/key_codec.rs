//! Reversible sanitation of version keys.
//!
//! The product store rejects `.` in document keys, so version identifiers
//! like `1.2` are stored as `1x2`. Only version-level keys are rewritten: the
//! walk is bound to the tree schema (env -> service -> version) and never
//! touches environment or service keys, or anything inside a rule.
//!
//! Raw identifiers never contain `x`, which keeps the mapping bijective.

use acl_types::AclTree;
use serde_json::{Map, Value};

/// Character a `.` becomes in storage.
pub const STORED_SEPARATOR: char = 'x';

/// Depth of version keys: 1 = env, 2 = service, 3 = version.
const VERSION_DEPTH: usize = 3;

/// Raw version identifier -> storage form.
pub fn encode(raw: &str) -> String {
    raw.replace('.', &STORED_SEPARATOR.to_string())
}

/// Storage form -> raw version identifier.
pub fn decode(stored: &str) -> String {
    stored.replace(STORED_SEPARATOR, ".")
}

/// Encode the version keys of a raw env -> service -> version document.
pub fn encode_document(doc: &Value) -> Value {
    rewrite_keys(doc, 1, encode)
}

/// Decode the version keys of a raw env -> service -> version document.
pub fn decode_document(doc: &Value) -> Value {
    rewrite_keys(doc, 1, decode)
}

/// Encode the version keys of a typed tree.
pub fn encode_tree(tree: &AclTree) -> AclTree {
    tree.map_version_keys(encode)
}

/// Decode the version keys of a typed tree.
pub fn decode_tree(tree: &AclTree) -> AclTree {
    tree.map_version_keys(decode)
}

fn rewrite_keys(value: &Value, depth: usize, f: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let rewritten: Map<String, Value> = map
                .iter()
                .map(|(key, child)| {
                    if depth == VERSION_DEPTH {
                        (f(key), child.clone())
                    } else {
                        (key.clone(), rewrite_keys(child, depth + 1, f))
                    }
                })
                .collect();
            Value::Object(rewritten)
        }
        other => other.clone(),
    }
}
