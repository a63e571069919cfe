//! Fixture schema shared by the unit tests of this crate.

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::{DatabaseMeta, PrepareContext, Schema};
use crate::types::Dialect;

pub fn fixture_meta() -> DatabaseMeta {
    serde_json::from_value(json!({
        "name": "shop",
        "type": "MongoDB",
        "models": [
            {
                "iid": "m_users", "name": "users", "type": "model",
                "fields": [
                    {"name": "_id", "type": "id", "required": true, "immutable": true, "creator": "system"},
                    {"name": "email", "type": "email", "required": true, "immutable": true},
                    {"name": "name", "type": "text", "required": true, "text": {"maxLength": 50}},
                    {"name": "nickname", "type": "text", "text": {"maxLength": 20}},
                    {"name": "status", "type": "enum", "defaultValue": "active",
                     "enum": {"selectList": ["active", "inactive"]}},
                    {"name": "age", "type": "integer"},
                    {"name": "score", "type": "decimal", "decimal": {"decimalDigits": 2}},
                    {"name": "tags", "type": "basic-values-list"},
                    {"name": "location", "type": "geo-point"},
                    {"name": "profile", "type": "object", "object": {"iid": "m_profile"}},
                    {"name": "items", "type": "object-list", "objectList": {"iid": "m_items"}},
                    {"name": "manager", "type": "reference", "reference": {"iid": "m_users"}},
                    {"name": "secret", "type": "encrypted-text", "encryptedText": {"maxLength": 64}},
                    {"name": "settings", "type": "json"},
                    {"name": "birthday", "type": "date"},
                    {"name": "createdAt", "type": "createdat", "required": true, "creator": "system"},
                    {"name": "updatedAt", "type": "updatedat", "required": true, "creator": "system"}
                ]
            },
            {
                "iid": "m_profile", "name": "profile", "type": "sub-model-object",
                "fields": [
                    {"name": "city", "type": "text", "text": {"maxLength": 40}},
                    {"name": "country", "type": "text", "defaultValue": "NL", "text": {"maxLength": 2}}
                ]
            },
            {
                "iid": "m_items", "name": "items", "type": "sub-model-list",
                "fields": [
                    {"name": "sku", "type": "text", "required": true, "text": {"maxLength": 12}},
                    {"name": "qty", "type": "integer", "defaultValue": 1},
                    {"name": "price", "type": "decimal", "decimal": {"decimalDigits": 2}}
                ]
            },
            {
                "iid": "m_orders", "name": "orders", "type": "model",
                "fields": [
                    {"name": "_id", "type": "id", "required": true, "immutable": true, "creator": "system"},
                    {"name": "customer", "type": "reference", "required": true, "reference": {"iid": "m_users"}},
                    {"name": "total", "type": "decimal", "decimal": {"decimalDigits": 2}},
                    {"name": "placedAt", "type": "datetime"}
                ]
            }
        ]
    }))
    .unwrap()
}

pub fn fixture_schema() -> Schema {
    Schema::from_meta(&fixture_meta()).unwrap()
}

/// Context with a fixed timestamp and no encryptor
pub fn timestamped(dialect: Dialect) -> PrepareContext {
    PrepareContext::with_timestamp(
        dialect,
        None,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    )
}
