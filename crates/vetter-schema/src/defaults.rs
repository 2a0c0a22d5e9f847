//! # Default Insertion
//!
//! A check schema may declare `default` values on its `properties`. Before
//! the check runs, missing members that have a declared default are filled
//! into the node being checked. This is how a passing rule rewrites a
//! node: the engine diffs the filled-in copy against the original and
//! reports (or commits) the difference.
//!
//! Walked keywords: `properties`, `items` (single schema or tuple form),
//! `allOf`, and `$ref` (local or registered). Conditional keywords
//! (`anyOf`, `oneOf`, `if`/`then`) are not walked, since which branch
//! applies is only known after validation.

use serde_json::Value;

use crate::registry::SchemaRegistry;

/// Reference chains longer than this stop inserting defaults. Only `$ref`
/// hops count; plain nesting is bounded by the schema itself.
const MAX_REF_DEPTH: usize = 32;

/// Fill declared defaults from `schema` into `node`.
///
/// `schema` doubles as the root for fragment-only `$ref`s.
pub fn insert_defaults(schema: &Value, registry: &SchemaRegistry, node: &mut Value) {
    walk(schema, schema, registry, node, 0);
}

fn walk(schema: &Value, root: &Value, registry: &SchemaRegistry, node: &mut Value, refs: usize) {
    if refs > MAX_REF_DEPTH {
        tracing::debug!(refs, "default insertion stopped at reference depth limit");
        return;
    }
    let Value::Object(keywords) = schema else {
        return;
    };

    if let Some(Value::String(reference)) = keywords.get("$ref") {
        match registry.resolve(reference, root) {
            Some((ref_root, target)) => walk(target, ref_root, registry, node, refs + 1),
            None => tracing::debug!(reference = %reference, "unresolved $ref skipped during default insertion"),
        }
    }

    if let Some(Value::Array(parts)) = keywords.get("allOf") {
        for part in parts {
            walk(part, root, registry, node, refs);
        }
    }

    if let (Some(Value::Object(properties)), Value::Object(members)) =
        (keywords.get("properties"), &mut *node)
    {
        for (name, sub) in properties {
            if !members.contains_key(name) {
                if let Some(default) = sub.get("default") {
                    members.insert(name.clone(), default.clone());
                }
            }
            if let Some(member) = members.get_mut(name) {
                walk(sub, root, registry, member, refs);
            }
        }
    }

    match (keywords.get("items"), node) {
        (Some(item_schema @ Value::Object(_)), Value::Array(elements)) => {
            for element in elements {
                walk(item_schema, root, registry, element, refs);
            }
        }
        (Some(Value::Array(tuple)), Value::Array(elements)) => {
            for (item_schema, element) in tuple.iter().zip(elements.iter_mut()) {
                walk(item_schema, root, registry, element, refs);
            }
        }
        _ => {}
    }
}
