use serde_json::json;

use super::*;
use crate::catalog::{Arity, FunctionRegistry};
use crate::error::ErrorCode;
use crate::schema::testing::fixture_schema;
use crate::schema::Schema;

fn field(schema: &Schema, model: &str, name: &str) -> Expression {
    let id = schema.model_by_name(model).unwrap();
    let field = schema.model(id).field(name).unwrap().clone();
    let path = field.query_path().to_string();
    Expression::Field(FieldValue::new(field, path, JoinType::None, id))
}

fn call(registry: &FunctionRegistry, name: &str, params: Vec<Expression>) -> Expression {
    Function::with_params(*registry.get(name).unwrap(), params).into()
}

fn lit(value: serde_json::Value) -> Expression {
    Expression::literal(value)
}

fn mongo(expression: &Expression) -> serde_json::Value {
    expression.get_query(Dialect::MongoDb, None).unwrap()
}

// ==================== Static values ====================

#[test]
fn test_static_values_render_unchanged() {
    for value in [json!(42), json!(-1.5), json!("text"), json!(true), json!(null)] {
        assert_eq!(mongo(&lit(value.clone())), value);
    }
}

#[test]
fn test_static_return_types() {
    assert_eq!(lit(json!(1)).return_type(), ReturnType::Number);
    assert_eq!(lit(json!("a")).return_type(), ReturnType::Text);
    assert_eq!(lit(json!(null)).return_type(), ReturnType::Null);
    assert_eq!(lit(json!(false)).expression_type(), ExpressionType::Static);
}

// ==================== Validation ====================

#[test]
fn test_fixed_arity_is_enforced() {
    let registry = FunctionRegistry::standard();
    let mut checked = 0;
    for name in registry.names() {
        let def = *registry.get(name).unwrap();
        let Arity::Exact(n) = def.arity else { continue };
        let arg = match def.params.expected(0) {
            ReturnType::Datetime => call(&registry, "now", vec![]),
            ReturnType::Geopoint => call(&registry, "point", vec![lit(json!(1)), lit(json!(2))]),
            ReturnType::Boolean => lit(json!(true)),
            ReturnType::Text => lit(json!("a")),
            _ => lit(json!(1)),
        };
        for count in [n.wrapping_sub(1), n + 1] {
            if count > n + 1 {
                continue;
            }
            let expr = call(&registry, name, vec![arg.clone(); count]);
            let err = expr.validate(Dialect::MongoDb).unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::InvalidParameter), "{}", name);
            checked += 1;
        }
    }
    assert!(checked > 50);
}

#[test]
fn test_variadic_needs_two_parameters() {
    let registry = FunctionRegistry::standard();
    let expr = call(&registry, "add", vec![lit(json!(1))]);
    let err = expr.validate(Dialect::MongoDb).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));
    assert!(err.to_string().contains("expects at least two input parameters"));

    let expr = call(&registry, "add", vec![lit(json!(1)), lit(json!(2)), lit(json!(3))]);
    assert!(expr.validate(Dialect::MongoDb).is_ok());
}

#[test]
fn test_parameter_types_are_checked() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(
        &registry,
        "add",
        vec![field(&schema, "users", "age"), field(&schema, "users", "name")],
    );
    let err = expr.validate(Dialect::MongoDb).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));
    assert!(err.to_string().contains("'number'"));
    assert!(err.to_string().contains("2nd"));
    assert!(err.to_string().contains("'text'"));
}

#[test]
fn test_primitive_rejects_array_fields() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(
        &registry,
        "eq",
        vec![field(&schema, "users", "tags"), lit(json!("vip"))],
    );
    assert_eq!(
        expr.validate(Dialect::MongoDb).unwrap_err().code(),
        Some(ErrorCode::InvalidParameter)
    );
}

#[test]
fn test_includes_flag_must_be_static_or_boolean() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let ok = call(
        &registry,
        "includes",
        vec![field(&schema, "users", "name"), lit(json!("an")), lit(json!(true))],
    );
    assert!(ok.validate(Dialect::MongoDb).is_ok());

    let bad = call(
        &registry,
        "includes",
        vec![
            field(&schema, "users", "name"),
            lit(json!("an")),
            field(&schema, "users", "age"),
        ],
    );
    assert!(bad.validate(Dialect::MongoDb).is_err());
}

#[test]
fn test_unavailable_mapping_is_unsupported() {
    let registry = FunctionRegistry::standard();
    let expr = call(&registry, "toObjectId", vec![lit(json!("64b7f0c2a1b2c3d4e5f60718"))]);
    assert!(expr.validate(Dialect::MongoDb).is_ok());
    let err = expr.validate(Dialect::PostgreSql).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UnsupportedFunction));
}

#[test]
fn test_nested_parameters_are_validated_first() {
    let registry = FunctionRegistry::standard();
    let inner = call(&registry, "sqrt", vec![]);
    let outer = call(&registry, "gt", vec![inner, lit(json!("x")), lit(json!(1))]);
    let err = outer.validate(Dialect::MongoDb).unwrap_err();
    assert!(err.to_string().contains("'sqrt'"));
}

// ==================== Pull validation ====================

#[test]
fn test_pull_whitelist() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(
        &registry,
        "or",
        vec![
            call(&registry, "eq", vec![field(&schema, "users", "age"), lit(json!(1))]),
            call(&registry, "eq", vec![field(&schema, "users", "age"), lit(json!(2))]),
        ],
    );
    assert!(expr.validate(Dialect::MongoDb).is_ok());
    let err = expr.validate_for_pull(Dialect::MongoDb).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UnsupportedFunction));
    assert!(err.to_string().contains("$or"));
}

#[test]
fn test_pull_requires_field_first_and_literal_second() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let reversed = call(&registry, "gt", vec![lit(json!(5)), field(&schema, "users", "age")]);
    assert!(reversed.validate(Dialect::MongoDb).is_ok());
    assert_eq!(
        reversed.validate_for_pull(Dialect::MongoDb).unwrap_err().code(),
        Some(ErrorCode::InvalidParameter)
    );

    let two_fields = call(
        &registry,
        "gt",
        vec![field(&schema, "users", "age"), field(&schema, "users", "score")],
    );
    assert_eq!(
        two_fields.validate_for_pull(Dialect::MongoDb).unwrap_err().code(),
        Some(ErrorCode::InvalidParameter)
    );
}

// ==================== Query generation ====================

#[test]
fn test_and_of_comparisons() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(
        &registry,
        "and",
        vec![
            call(&registry, "gt", vec![field(&schema, "users", "age"), lit(json!(18))]),
            call(&registry, "eq", vec![field(&schema, "users", "status"), lit(json!("active"))]),
        ],
    );
    expr.validate(Dialect::MongoDb).unwrap();
    assert_eq!(
        mongo(&expr),
        json!({"$and": [{"$gt": ["$age", 18]}, {"$eq": ["$status", "active"]}]})
    );
}

#[test]
fn test_unary_native_operators_are_unwrapped() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(&registry, "length", vec![field(&schema, "users", "name")]);
    assert_eq!(mongo(&expr), json!({"$strLenCP": "$name"}));
    let expr = call(&registry, "degrees", vec![lit(json!(1))]);
    assert_eq!(mongo(&expr), json!({"$radiansToDegrees": 1}));
}

#[test]
fn test_nested_field_paths() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let profile = schema
        .model(schema.model_by_name("users").unwrap())
        .field("profile")
        .unwrap()
        .sub_model()
        .unwrap();
    let city = schema.model(profile).field("city").unwrap().clone();
    let expr = call(
        &registry,
        "eq",
        vec![
            Expression::Field(FieldValue::new(city, "profile.city", JoinType::None, profile)),
            lit(json!("Utrecht")),
        ],
    );
    assert_eq!(mongo(&expr), json!({"$eq": ["$profile.city", "Utrecht"]}));
}

#[test]
fn test_membership_and_existence() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let mut list = ArrayValue::new();
    list.add_entry(lit(json!("active")));
    list.add_entry(lit(json!("inactive")));
    let expr = call(
        &registry,
        "in",
        vec![field(&schema, "users", "status"), Expression::Array(list.clone())],
    );
    assert_eq!(
        mongo(&expr),
        json!({"$in": ["$status", {"$ifNull": [["active", "inactive"], []]}]})
    );
    let expr = call(
        &registry,
        "nin",
        vec![field(&schema, "users", "status"), Expression::Array(list)],
    );
    assert_eq!(
        mongo(&expr),
        json!({"$not": [{"$in": ["$status", {"$ifNull": [["active", "inactive"], []]}]}]})
    );
    let expr = call(&registry, "exists", vec![field(&schema, "users", "nickname")]);
    assert_eq!(mongo(&expr), json!({"$ne": [{"$type": "$nickname"}, "missing"]}));
}

#[test]
fn test_string_helpers() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let name = field(&schema, "users", "name");

    let expr = call(&registry, "startsWith", vec![name.clone(), lit(json!("Ja"))]);
    assert_eq!(
        mongo(&expr),
        json!({"$eq": [{"$substrCP": ["$name", 0, {"$strLenCP": "Ja"}]}, "Ja"]})
    );

    let expr = call(&registry, "left", vec![name.clone(), lit(json!(2))]);
    assert_eq!(mongo(&expr), json!({"$substrCP": ["$name", 0, 2]}));

    let expr = call(&registry, "right", vec![name.clone(), lit(json!(2))]);
    assert_eq!(
        mongo(&expr),
        json!({"$substrCP": ["$name", {"$max": [0, {"$subtract": [{"$strLenCP": "$name"}, 2]}]}, 2]})
    );

    let expr = call(&registry, "trim", vec![name.clone()]);
    assert_eq!(mongo(&expr), json!({"$trim": {"input": "$name"}}));

    let expr = call(
        &registry,
        "includes",
        vec![name.clone(), lit(json!("a.b")), lit(json!(true))],
    );
    assert_eq!(
        mongo(&expr),
        json!({"$regexMatch": {"input": "$name", "regex": "a\\.b", "options": "i"}})
    );

    let expr = call(&registry, "includes", vec![name, lit(json!("x"))]);
    assert_eq!(
        mongo(&expr),
        json!({"$regexMatch": {"input": "$name", "regex": "x"}})
    );
}

#[test]
fn test_distance_uses_haversine() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let here = call(&registry, "point", vec![lit(json!(4.9)), lit(json!(52.4))]);
    let expr = call(&registry, "distance", vec![field(&schema, "users", "location"), here]);
    expr.validate(Dialect::MongoDb).unwrap();
    let rendered = mongo(&expr);
    assert_eq!(rendered["$multiply"][0], json!(2));
    assert_eq!(rendered["$multiply"][1], json!(custom::EARTH_RADIUS_KM));
    let text = rendered.to_string();
    assert!(text.contains("$asin"));
    assert!(text.contains("\"input\":\"$location\""));
}

#[test]
fn test_relational_dialects_render_nothing() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(&registry, "eq", vec![field(&schema, "users", "age"), lit(json!(1))]);
    for dialect in [Dialect::PostgreSql, Dialect::MySql, Dialect::SqlServer, Dialect::Oracle] {
        assert!(expr.get_query(dialect, None).is_none());
        assert!(expr.get_pull_query(dialect, PullTarget::Document).is_none());
    }
}

#[test]
fn test_resolver_rewrites_base_fields() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let orders = schema.model_by_name("orders").unwrap();
    let customer = schema.model(orders).field("customer").unwrap().clone();
    let joined = Expression::Field(FieldValue::new(
        customer,
        "purchases.customer",
        JoinType::Complex,
        orders,
    ));
    let expr = call(&registry, "eq", vec![joined, field(&schema, "users", "_id")]);
    assert!(expr.has_join_field_values());

    let mut seen = Vec::new();
    let mut resolver = |path: &str| {
        seen.push(path.to_string());
        "$fld_abc".to_string()
    };
    let rendered = expr.get_query(Dialect::MongoDb, Some(&mut resolver)).unwrap();
    assert_eq!(rendered, json!({"$eq": ["$customer", "$$fld_abc"]}));
    assert_eq!(seen, vec!["_id"]);
}

#[test]
fn test_resolver_reaches_nested_parameters() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let sum = call(&registry, "add", vec![field(&schema, "users", "age"), lit(json!(1))]);
    let expr = call(
        &registry,
        "and",
        vec![
            call(&registry, "gt", vec![sum, lit(json!(18))]),
            call(
                &registry,
                "eq",
                vec![field(&schema, "users", "name"), field(&schema, "users", "nickname")],
            ),
        ],
    );

    let mut calls = 0;
    let mut resolver = |path: &str| {
        calls += 1;
        format!("$v_{}", path)
    };
    let rendered = expr.get_query(Dialect::MongoDb, Some(&mut resolver)).unwrap();
    assert_eq!(
        rendered,
        json!({"$and": [
            {"$gt": [{"$add": ["$$v_age", 1]}, 18]},
            {"$eq": ["$$v_name", "$$v_nickname"]}
        ]})
    );
    assert_eq!(calls, 3);
}

// ==================== Pull queries ====================

#[test]
fn test_pull_query_on_documents() {
    let registry = FunctionRegistry::standard();
    let sku = Expression::ArrayFilterField(ArrayFilterFieldValue::new("sku", None));
    let qty = Expression::ArrayFilterField(ArrayFilterFieldValue::new("qty", None));
    let expr = call(
        &registry,
        "and",
        vec![
            call(&registry, "eq", vec![sku, lit(json!("A-1"))]),
            call(&registry, "neq", vec![qty, lit(json!(0))]),
        ],
    );
    expr.validate_for_pull(Dialect::MongoDb).unwrap();
    assert_eq!(
        expr.get_pull_query(Dialect::MongoDb, PullTarget::Document).unwrap(),
        json!({"$and": [{"sku": {"$eq": "A-1"}}, {"qty": {"$ne": 0}}]})
    );
}

#[test]
fn test_pull_query_on_scalars_merges_operators() {
    let schema = fixture_schema();
    let registry = FunctionRegistry::standard();
    let expr = call(
        &registry,
        "and",
        vec![
            call(&registry, "gte", vec![field(&schema, "users", "age"), lit(json!(3))]),
            call(&registry, "lte", vec![field(&schema, "users", "age"), lit(json!(9))]),
        ],
    );
    assert_eq!(
        expr.get_pull_query(Dialect::MongoDb, PullTarget::Value).unwrap(),
        json!({"$gte": 3, "$lte": 9})
    );
}

#[test]
fn test_exists_pull_query() {
    let registry = FunctionRegistry::standard();
    let elem = Expression::ArrayFilterField(ArrayFilterFieldValue::new("elem.price", None));
    let expr = call(&registry, "exists", vec![elem]);
    assert_eq!(
        expr.get_pull_query(Dialect::MongoDb, PullTarget::Document).unwrap(),
        json!({"elem.price": {"$exists": true}})
    );
}

#[test]
fn test_negated_exists_pull_query() {
    let registry = FunctionRegistry::standard();
    let elem = Expression::ArrayFilterField(ArrayFilterFieldValue::new("elem.price", None));
    let expr = call(&registry, "not", vec![call(&registry, "exists", vec![elem])]);
    expr.validate_for_pull(Dialect::MongoDb).unwrap();
    assert_eq!(
        expr.get_pull_query(Dialect::MongoDb, PullTarget::Document).unwrap(),
        json!({"elem.price": {"$exists": false}})
    );
    assert_eq!(
        expr.get_pull_query(Dialect::MongoDb, PullTarget::Value).unwrap(),
        json!({"$exists": false})
    );

    let negated_eq = call(
        &registry,
        "not",
        vec![call(
            &registry,
            "eq",
            vec![
                Expression::ArrayFilterField(ArrayFilterFieldValue::new("elem.price", None)),
                lit(json!(3)),
            ],
        )],
    );
    let err = negated_eq.validate_for_pull(Dialect::MongoDb).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UnsupportedFunction));
}
