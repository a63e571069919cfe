//! Where clauses, joins and read commands compiled through the public client API

mod common;

use common::{shop_database, FIRST_ID};
use docql::{ErrorCode, FindManyOptions, FindOptions};
use serde_json::{json, Value};

fn stage_names(pipeline: &Value) -> Vec<&str> {
    pipeline
        .as_array()
        .unwrap()
        .iter()
        .map(|stage| stage.as_object().unwrap().keys().next().unwrap().as_str())
        .collect()
}

// ============================================================================
// Where clauses
// ============================================================================

#[tokio::test]
async fn test_multiple_keys_are_combined_with_and() {
    let mut action = common::action("users").await;
    action
        .set_where(&json!({"age": {"$gt": 18}, "status": "active"}))
        .unwrap();
    assert_eq!(
        docql::pipeline::filter(action.definition()),
        json!({"$expr": {"$and": [{"$gt": ["$age", 18]}, {"$eq": ["$status", "active"]}]}})
    );
}

#[tokio::test]
async fn test_single_key_has_no_and_wrapper() {
    let mut action = common::action("users").await;
    action.set_where(&json!({"status": "inactive"})).unwrap();
    assert_eq!(
        docql::pipeline::filter(action.definition()),
        json!({"$expr": {"$eq": ["$status", "inactive"]}})
    );
}

#[tokio::test]
async fn test_invalid_where_is_rejected_before_execution() {
    let (database, adapter) = shop_database().await;
    let users = database.model("users").unwrap();

    let err = users
        .find_many(&json!({"shoeSize": 42}), FindManyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidExpression));

    let err = users
        .find_many(&json!({"$add": [1]}), FindManyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));

    assert!(adapter.commands().await.is_empty());
}

// ============================================================================
// Joins
// ============================================================================

#[tokio::test]
async fn test_where_on_joined_field_runs_after_lookup() {
    let (database, _) = shop_database().await;
    let users = database.model("users").unwrap();
    let options = FindManyOptions {
        join: Some(json!("manager")),
        sort: Some(json!({"manager.name": "asc"})),
        skip: Some(json!(10)),
        limit: Some(json!(5)),
        ..Default::default()
    };
    let command = users
        .find_many(&json!({"manager.status": "active"}), options)
        .await
        .unwrap();

    assert_eq!(command["aggregate"], json!("users"));
    assert_eq!(
        stage_names(&command["pipeline"]),
        vec!["$lookup", "$unwind", "$match", "$sort", "$skip", "$limit"]
    );
    assert_eq!(
        command["pipeline"][2],
        json!({"$match": {"$expr": {"$eq": ["$manager.status", "active"]}}})
    );
    assert_eq!(command["pipeline"][3], json!({"$sort": {"manager.name": 1}}));
}

#[tokio::test]
async fn test_named_join_binds_base_fields() {
    let (database, _) = shop_database().await;
    let users = database.model("users").unwrap();
    let options = FindManyOptions {
        join: Some(json!({
            "as": "purchases",
            "from": "orders",
            "where": {"$eq": ["$purchases.customer", "$_id"]}
        })),
        ..Default::default()
    };
    let command = users
        .find_many(&json!({"status": "active"}), options)
        .await
        .unwrap();

    assert_eq!(stage_names(&command["pipeline"]), vec!["$match", "$lookup"]);
    let lookup = &command["pipeline"][1]["$lookup"];
    assert_eq!(lookup["from"], json!("orders"));
    assert_eq!(lookup["as"], json!("purchases"));

    let bindings = lookup["let"].as_object().unwrap();
    assert_eq!(bindings.len(), 1);
    let (variable, source) = bindings.iter().next().unwrap();
    assert!(variable.starts_with("fld_"));
    assert_eq!(variable.len(), 10);
    assert_eq!(source, &json!("$_id"));
    assert_eq!(
        lookup["pipeline"],
        json!([{"$match": {"$expr": {"$eq": ["$customer", format!("$${}", variable)]}}}])
    );
}

#[tokio::test]
async fn test_join_on_non_reference_field_fails() {
    let (database, _) = shop_database().await;
    let users = database.model("users").unwrap();
    let options = FindOptions {
        join: Some(json!("profile")),
        ..Default::default()
    };
    let err = users
        .find_one(&json!({"status": "active"}), options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidJoin));
}

// ============================================================================
// Read commands
// ============================================================================

#[tokio::test]
async fn test_find_by_id_with_join_matches_the_id_first() {
    let (database, _) = shop_database().await;
    let orders = database.model("orders").unwrap();
    let options = FindOptions {
        join: Some(json!("customer")),
        select: Some(json!(["total", "customer"])),
        use_read_replica: true,
        ..Default::default()
    };
    let command = orders.find_by_id(&json!(FIRST_ID), options).await.unwrap();

    assert_eq!(
        stage_names(&command["pipeline"]),
        vec!["$match", "$lookup", "$unwind", "$project"]
    );
    assert_eq!(command["pipeline"][0], json!({"$match": {"_id": {"$oid": FIRST_ID}}}));
    assert_eq!(command["pipeline"][3], json!({"$project": {"total": 1, "customer": 1}}));
    assert_eq!(command["readPreference"], json!("secondaryPreferred"));
}

#[tokio::test]
async fn test_select_and_omit_are_exclusive() {
    let (database, _) = shop_database().await;
    let users = database.model("users").unwrap();
    let options = FindOptions {
        select: Some(json!("name")),
        omit: Some(json!("email")),
        ..Default::default()
    };
    let err = users.find_by_id(&json!(FIRST_ID), options).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidValue));

    let err = users
        .find_by_id(&json!("not-an-id"), FindOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidValue));
}
