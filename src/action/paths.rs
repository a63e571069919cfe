//! Field path resolution against the schema and the active joins.

use once_cell::sync::Lazy;
use regex::Regex;

use docql_core::{Field, FieldKind, JoinType, ModelId, Schema};

use super::definition::JoinDef;

/// `$`, `$[]` and `$[identifier]` update path segments
static POSITIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$(\[[A-Za-z][A-Za-z0-9_]*\]|\[\])?$").expect("positional segment pattern")
});

/// A path that resolved to a schema field
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub field: Field,
    /// Path as it is addressed in the compiled query
    pub path: String,
    pub join: JoinType,
    /// Model owning the last segment
    pub model: ModelId,
}

pub fn is_positional_segment(segment: &str) -> bool {
    POSITIONAL_RE.is_match(segment)
}

/// Drop positional segments so the remainder can be resolved against the schema
pub fn strip_positional(path: &str) -> (String, bool) {
    let mut positional = false;
    let kept: Vec<&str> = path
        .split('.')
        .filter(|segment| {
            let skip = is_positional_segment(segment);
            positional |= skip;
            !skip
        })
        .collect();
    (kept.join("."), positional)
}

/// Resolve a dotted path.
///
/// Single segments check the model's own fields first and then the named joins.
/// Longer paths descend through object and object-list fields; a reference field is
/// only crossed when a simple join on it is active, and a leading named-join alias
/// switches to the joined model.
pub fn resolve_field(
    schema: &Schema,
    model: ModelId,
    path: &str,
    joins: &[JoinDef],
) -> Option<ResolvedField> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }

    if let [name] = segments.as_slice() {
        if let Some(field) = schema.model(model).field(name) {
            return Some(ResolvedField {
                path: field.query_path().to_string(),
                field: field.clone(),
                join: JoinType::None,
                model,
            });
        }
        return joins
            .iter()
            .find(|join| join.kind == JoinType::Complex && join.alias == *name)
            .map(|join| ResolvedField {
                field: Field::join_alias(&join.alias, join.target, model),
                path: join.alias.clone(),
                join: JoinType::Complex,
                model,
            });
    }

    let (last, walk) = segments.split_last()?;
    let mut current = model;
    let mut join = JoinType::None;
    let mut prefix = String::new();

    for (position, segment) in walk.iter().enumerate() {
        if position == 0 && schema.model(current).field(segment).is_none() {
            let alias = joins
                .iter()
                .find(|j| j.kind == JoinType::Complex && j.alias == *segment)?;
            current = alias.target;
            join = JoinType::Complex;
            prefix = format!("{}.", alias.alias);
            continue;
        }

        let field = schema.model(current).field(segment)?;
        match field.kind() {
            FieldKind::Object { sub_model } | FieldKind::ObjectList { sub_model } => {
                current = *sub_model;
            }
            FieldKind::Reference {
                target: Some(target),
            } if join == JoinType::None => {
                let joined = joins.iter().any(|j| {
                    j.kind == JoinType::Simple && j.alias == field.query_path()
                });
                if !joined {
                    return None;
                }
                prefix = format!("{}.", field.query_path());
                current = *target;
                join = JoinType::Simple;
            }
            _ => return None,
        }
    }

    let field = schema.model(current).field(last)?;
    Some(ResolvedField {
        path: format!("{}{}", prefix, field.query_path()),
        field: field.clone(),
        join,
        model: current,
    })
}
