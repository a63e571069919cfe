//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use docql_core::{JoinType, ModelId, Schema};

use crate::action::{ActionEnv, DbAction, JoinDef};
use crate::explain::ExplainAdapter;

pub const SHOP_SCHEMA: &str = include_str!("../demos/shop.json");

/// Object identifiers usable wherever a reference or `_id` is expected
pub struct ObjectId;

impl ObjectId {
    pub const FIRST: &'static str = "64b7f1c2a9e4d3b2c1a09f8e";
    pub const SECOND: &'static str = "64b7f1c2a9e4d3b2c1a09f8f";
}

pub fn fixture_schema() -> Schema {
    Schema::from_json(SHOP_SCHEMA).expect("shop schema should parse")
}

/// Action on a model of the shop schema with a fixed clock
pub fn fixture_action(model: &str) -> DbAction {
    let schema = Arc::new(fixture_schema());
    let id = schema.model_by_name(model).expect("model should exist");
    let env = ActionEnv::new(schema, Arc::new(ExplainAdapter::new()));
    let timestamp = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    DbAction::new(env, id).with_timestamp(timestamp)
}

pub fn simple_join(schema: &Schema, model: ModelId, field: &str) -> JoinDef {
    let field = schema
        .model(model)
        .field(field)
        .expect("reference field should exist")
        .clone();
    let target = match field.kind() {
        &docql_core::FieldKind::Reference { target: Some(target) } => target,
        other => panic!("not a resolved reference: {:?}", other),
    };
    JoinDef {
        kind: JoinType::Simple,
        alias: field.query_path().to_string(),
        field: Some(field),
        target,
        from: schema.model(target).qualified_name(),
        condition: None,
    }
}

/// Named join without a condition, for path resolution tests
pub fn complex_join(schema: &Schema, _model: ModelId, from: &str, alias: &str) -> JoinDef {
    let target = schema.model_by_name(from).expect("join target should exist");
    JoinDef {
        kind: JoinType::Complex,
        alias: alias.to_string(),
        field: None,
        target,
        from: schema.model(target).qualified_name(),
        condition: None,
    }
}
