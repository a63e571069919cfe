use serde_json::{Map, Value};

use docql_core::{
    DocqlError, DocqlResult, ErrorCode, FieldKind, FunctionRegistry, JoinType, ModelId, Schema,
};

use super::condition::{ConditionCompiler, ConditionMode};
use super::definition::JoinDef;
use super::paths::resolve_field;

/// Normalize a join option into join descriptors.
///
/// Accepts a reference field name, a `{as, from, where}` object, or an array mixing
/// both. Repeated simple joins on the same field collapse into one.
pub fn build_joins(
    schema: &Schema,
    registry: &FunctionRegistry,
    model: ModelId,
    spec: &Value,
) -> DocqlResult<Vec<JoinDef>> {
    let mut joins: Vec<JoinDef> = Vec::new();
    let entries = match spec {
        Value::Array(entries) => entries.as_slice(),
        single => std::slice::from_ref(single),
    };

    for entry in entries {
        let join = match entry {
            Value::String(name) => simple_join(schema, model, name)?,
            Value::Object(map) => complex_join(schema, registry, model, map, &joins)?,
            other => {
                return Err(invalid_join(format!(
                    "Join definitions need to be reference field names or {{as, from, where}} objects but received '{}'",
                    other
                )))
            }
        };
        if joins.iter().any(|existing| existing.alias == join.alias) {
            if join.kind == JoinType::Simple {
                continue;
            }
            return Err(invalid_join(format!(
                "The join alias '{}' is used more than once",
                join.alias
            )));
        }
        joins.push(join);
    }

    tracing::debug!(
        "Built {} join(s) for model '{}'",
        joins.len(),
        schema.model(model).name()
    );
    Ok(joins)
}

fn simple_join(schema: &Schema, model: ModelId, name: &str) -> DocqlResult<JoinDef> {
    let resolved = resolve_field(schema, model, name, &[]).ok_or_else(|| {
        invalid_join(format!(
            "Cannot identify the reference field '{}' to join in the '{}' model",
            name,
            schema.model(model).name()
        ))
    })?;
    let &FieldKind::Reference {
        target: Some(target),
    } = resolved.field.kind()
    else {
        return Err(invalid_join(format!(
            "'{}' is not a reference field and cannot be joined",
            name
        )));
    };

    Ok(JoinDef {
        kind: JoinType::Simple,
        alias: resolved.field.query_path().to_string(),
        field: Some(resolved.field),
        target,
        from: schema.model(target).qualified_name(),
        condition: None,
    })
}

fn complex_join(
    schema: &Schema,
    registry: &FunctionRegistry,
    model: ModelId,
    spec: &Map<String, Value>,
    previous: &[JoinDef],
) -> DocqlResult<JoinDef> {
    let alias = match spec.get("as") {
        Some(Value::String(alias)) if !alias.trim().is_empty() => alias.trim().to_string(),
        _ => return Err(invalid_join("Named joins need an 'as' alias")),
    };
    if alias.contains('.') {
        return Err(invalid_join(format!(
            "The join alias '{}' cannot contain '.' characters",
            alias
        )));
    }
    if schema.model(model).field(&alias).is_some() {
        return Err(invalid_join(format!(
            "The join alias '{}' collides with a field of the '{}' model",
            alias,
            schema.model(model).name()
        )));
    }

    let from = spec
        .get("from")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_join(format!("The join '{}' needs a 'from' model", alias)))?;
    let target = schema.model_by_name(from).ok_or_else(|| {
        invalid_join(format!(
            "The join '{}' refers to the unknown model '{}'",
            alias, from
        ))
    })?;
    let condition = spec
        .get("where")
        .ok_or_else(|| invalid_join(format!("The join '{}' needs a 'where' condition", alias)))?;

    let mut join = JoinDef {
        kind: JoinType::Complex,
        alias,
        field: None,
        target,
        from: schema.model(target).qualified_name(),
        condition: None,
    };

    let mut visible = previous.to_vec();
    visible.push(join.clone());
    let compiled = ConditionCompiler::new(schema, registry, model, &visible, ConditionMode::Query)
        .compile(condition)?;
    join.condition = Some(compiled);
    Ok(join)
}

fn invalid_join(message: impl Into<String>) -> DocqlError {
    DocqlError::client(ErrorCode::InvalidJoin, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_schema;
    use serde_json::json;

    fn joins(spec: Value) -> DocqlResult<Vec<JoinDef>> {
        let schema = fixture_schema();
        let registry = FunctionRegistry::standard();
        let users = schema.model_by_name("users").unwrap();
        build_joins(&schema, &registry, users, &spec)
    }

    #[test]
    fn test_normalizes_every_form() {
        let single = joins(json!("manager")).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].kind, JoinType::Simple);
        assert_eq!(single[0].alias, "manager");
        assert_eq!(single[0].from, "users");

        let mixed = joins(json!([
            "manager",
            "manager",
            {"as": "orders", "from": "orders", "where": {"$eq": ["$orders.customer", "$_id"]}}
        ]))
        .unwrap();
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed[1].kind, JoinType::Complex);
        assert!(mixed[1].condition.is_some());
    }

    #[test]
    fn test_rejects_bad_aliases() {
        let err = joins(json!({"as": "name", "from": "orders", "where": {"total": 1}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));

        let err = joins(json!({"as": "a.b", "from": "orders", "where": {"total": 1}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));

        let err = joins(json!({"as": "recent", "from": "nowhere", "where": {"total": 1}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));
    }

    #[test]
    fn test_rejects_non_reference_fields() {
        let err = joins(json!("age")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));
        let err = joins(json!(42)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));
    }
}
