//! Common test utilities for DocQL tests
//!
//! Provides shared helper functions for:
//! - Loading the shop fixture schema
//! - Building a client backed by the explain adapter
//! - Creating fresh actions on a model

#![allow(dead_code)]

use std::sync::Arc;

use docql::{Client, Database, DbAction, ExplainAdapter, SharedAdapter, StaticMetadata};

pub const SHOP_SCHEMA: &str = include_str!("../../demos/shop.json");

pub const FIRST_ID: &str = "64b7f1c2a9e4d3b2c1a09f8e";
pub const SECOND_ID: &str = "64b7f1c2a9e4d3b2c1a09f8f";

pub fn create_test_client() -> (Client, Arc<ExplainAdapter>) {
    let adapter = Arc::new(ExplainAdapter::new());
    let metadata = StaticMetadata::from_json(SHOP_SCHEMA).expect("Failed to parse shop schema");
    let client = Client::new(Arc::new(metadata), Arc::new(SharedAdapter(adapter.clone())));
    (client, adapter)
}

pub async fn shop_database() -> (Arc<Database>, Arc<ExplainAdapter>) {
    let (client, adapter) = create_test_client();
    let database = client.database("shop").await.expect("shop database");
    (database, adapter)
}

pub async fn action(model: &str) -> DbAction {
    let (database, _) = shop_database().await;
    database.action(model).expect("model should exist")
}
