//! Schema arena: models, sub-models and their fields.
//!
//! Every model of a database (top-level and nested) lives in one `Vec` owned by the
//! [`Schema`]. Fields refer to their owning model and to their sub-models by
//! [`ModelId`], never by pointer.

mod field;
pub mod formats;
pub mod meta;
mod prepare;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

pub use field::{Field, FieldKind};
pub use meta::{Creator, DatabaseMeta, FieldMeta, ModelMeta, ModelType};
pub use prepare::{PrepareContext, TextEncryptor};

use crate::error::{DocqlError, DocqlResult, ErrorCode};
use crate::types::Dialect;

/// Index of a model inside its [`Schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

#[derive(Debug, Clone)]
pub struct Model {
    id: ModelId,
    iid: String,
    name: String,
    schema: Option<String>,
    model_type: ModelType,
    parent: Option<ModelId>,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
}

impl Model {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn iid(&self) -> &str {
        &self.iid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name prefixed with the relational schema when one is set
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Model holding the object/object-list field this sub-model belongs to
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

/// Read-only schema graph of one database
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    dialect: Dialect,
    models: Vec<Model>,
    top_level: HashMap<String, ModelId>,
}

impl Schema {
    pub fn from_json(text: &str) -> DocqlResult<Self> {
        let meta: DatabaseMeta = serde_json::from_str(text)?;
        Self::from_meta(&meta)
    }

    pub fn from_meta(meta: &DatabaseMeta) -> DocqlResult<Self> {
        let ids: HashMap<&str, ModelId> = meta
            .models
            .iter()
            .enumerate()
            .map(|(i, model)| (model.iid.as_str(), ModelId(i)))
            .collect();
        let resolve = |iid: &str| ids.get(iid).copied();

        let mut models = Vec::with_capacity(meta.models.len());
        let mut explicit_paths: Vec<Vec<bool>> = Vec::with_capacity(meta.models.len());
        for (i, model_meta) in meta.models.iter().enumerate() {
            let id = ModelId(i);
            let mut fields = Vec::with_capacity(model_meta.fields.len());
            let mut explicit = Vec::with_capacity(model_meta.fields.len());
            for field_meta in &model_meta.fields {
                let path = field_meta
                    .query_path
                    .clone()
                    .unwrap_or_else(|| field_meta.name.clone());
                match Field::from_meta(field_meta, id, path, &resolve)
                    .map_err(|msg| DocqlError::client(ErrorCode::SubmodelNotFound, msg))?
                {
                    Some(field) => {
                        fields.push(field);
                        explicit.push(field_meta.query_path.is_some());
                    }
                    None => tracing::warn!(
                        "Skipping field '{}' of model '{}' with unknown type '{}'",
                        field_meta.name,
                        model_meta.name,
                        field_meta.field_type
                    ),
                }
            }
            let by_name = fields
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name().to_string(), i))
                .collect();
            models.push(Model {
                id,
                iid: model_meta.iid.clone(),
                name: model_meta.name.clone(),
                schema: model_meta.schema.clone(),
                model_type: model_meta.model_type,
                parent: None,
                fields,
                by_name,
            });
            explicit_paths.push(explicit);
        }

        // Link sub-models to their parents and derive dotted query paths top-down
        let mut stack: Vec<(ModelId, Option<String>)> = models
            .iter()
            .filter(|model| model.model_type == ModelType::Model)
            .map(|model| (model.id, None))
            .collect();
        let mut visited = vec![false; models.len()];
        while let Some((id, prefix)) = stack.pop() {
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            let mut children = Vec::new();
            for (i, field) in models[id.0].fields.iter_mut().enumerate() {
                if let Some(prefix) = &prefix {
                    if !explicit_paths[id.0][i] {
                        field.set_query_path(format!("{}.{}", prefix, field.name()));
                    }
                }
                if let Some(sub_model) = field.sub_model() {
                    children.push((sub_model, field.query_path().to_string()));
                }
            }
            for (sub_model, path) in children {
                models[sub_model.0].parent = Some(id);
                stack.push((sub_model, Some(path)));
            }
        }

        let top_level = models
            .iter()
            .filter(|model| model.model_type == ModelType::Model)
            .flat_map(|model| {
                let mut names = vec![(model.name.clone(), model.id)];
                if model.schema.is_some() {
                    names.push((model.qualified_name(), model.id));
                }
                names
            })
            .collect();

        tracing::debug!(
            "Loaded schema '{}' ({}) with {} models",
            meta.name,
            meta.dialect,
            models.len()
        );

        Ok(Schema {
            name: meta.name.clone(),
            dialect: meta.dialect,
            models,
            top_level,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    /// Look up a top-level model by name (or `schema.name`)
    pub fn model_by_name(&self, name: &str) -> Option<ModelId> {
        self.top_level.get(name).copied()
    }

    /// Run every field of `model` over `input` and return the prepared document.
    ///
    /// Issues accumulate in `ctx`; the caller decides when to raise them.
    pub fn prepare_field_values<'a>(
        &'a self,
        model: ModelId,
        input: &'a Map<String, Value>,
        is_create: bool,
        ctx: &'a mut PrepareContext,
        index: Option<usize>,
    ) -> BoxFuture<'a, Map<String, Value>> {
        async move {
            let mut prepared = Map::new();
            for field in self.model(model).fields() {
                field
                    .prepare(self, input.get(field.name()), &mut prepared, ctx, is_create, index)
                    .await;
            }
            prepared
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{fixture_schema, timestamped};
    use super::*;
    use crate::error::ValidationCode;
    use serde_json::json;

    fn codes(ctx: &PrepareContext) -> Vec<&'static str> {
        ctx.issues().iter().map(|i| i.code.as_str()).collect()
    }

    async fn create(input: Value) -> (Map<String, Value>, PrepareContext) {
        let schema = fixture_schema();
        let users = schema.model_by_name("users").unwrap();
        let mut ctx = timestamped(schema.dialect());
        let input = input.as_object().unwrap().clone();
        let prepared = schema
            .prepare_field_values(users, &input, true, &mut ctx, None)
            .await;
        (prepared, ctx)
    }

    // ==================== Arena ====================

    #[test]
    fn test_sub_model_query_paths_are_dotted() {
        let schema = fixture_schema();
        let users = schema.model(schema.model_by_name("users").unwrap());
        let profile = users.field("profile").unwrap();
        let sub = schema.model(profile.sub_model().unwrap());
        assert_eq!(sub.field("city").unwrap().query_path(), "profile.city");
        assert_eq!(sub.parent(), Some(users.id()));
        assert_eq!(sub.model_type(), ModelType::SubModelObject);
    }

    #[test]
    fn test_unknown_field_types_are_skipped() {
        let schema = Schema::from_json(
            r#"{"name": "db", "type": "MongoDB", "models": [
                {"iid": "m1", "name": "notes", "type": "model", "fields": [
                    {"name": "body", "type": "text"},
                    {"name": "blob", "type": "hologram"}
                ]}
            ]}"#,
        )
        .unwrap();
        let notes = schema.model(schema.model_by_name("notes").unwrap());
        assert!(notes.field("body").is_some());
        assert!(notes.field("blob").is_none());
    }

    #[test]
    fn test_missing_sub_model_is_an_error() {
        let err = Schema::from_json(
            r#"{"name": "db", "type": "MongoDB", "models": [
                {"iid": "m1", "name": "notes", "type": "model", "fields": [
                    {"name": "parts", "type": "object-list", "objectList": {"iid": "nope"}}
                ]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SubmodelNotFound));
    }

    // ==================== Create preparation ====================

    #[tokio::test]
    async fn test_create_fills_defaults_and_system_fields() {
        let (prepared, ctx) = create(json!({
            "email": "jane@example.com",
            "name": "Jane",
            "age": 30.6
        }))
        .await;
        assert!(!ctx.has_issues(), "{:?}", ctx.issues());
        assert_eq!(prepared["status"], json!("active"));
        assert_eq!(prepared["age"], json!(31));
        assert_eq!(prepared["tags"], json!([]));
        assert_eq!(prepared["items"], json!([]));
        assert_eq!(prepared["createdAt"], ctx.timestamp_value());
        assert_eq!(prepared["updatedAt"], ctx.timestamp_value());
        assert!(prepared.get("_id").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_user_field() {
        let (_, ctx) = create(json!({"email": "jane@example.com"})).await;
        assert_eq!(codes(&ctx), vec!["missing_required_field_value"]);
        assert_eq!(ctx.issues()[0].details.field, "name");
    }

    #[tokio::test]
    async fn test_geo_point_bounds() {
        let (_, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "location": [200, 10]
        }))
        .await;
        assert_eq!(ctx.issues()[0].code, ValidationCode::InvalidLongitudeValue);

        let (_, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "location": [10, -95]
        }))
        .await;
        assert_eq!(ctx.issues()[0].code, ValidationCode::InvalidLatitudeValue);

        let (prepared, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "location": [10, 45]
        }))
        .await;
        assert!(!ctx.has_issues());
        assert_eq!(
            prepared["location"],
            json!({"type": "Point", "coordinates": [10.0, 45.0]})
        );
    }

    #[tokio::test]
    async fn test_every_issue_is_collected() {
        let (_, ctx) = create(json!({
            "email": "not-an-email",
            "name": {"first": "Jane"},
            "status": "gone",
            "score": "high",
            "tags": ["a", {"b": 1}]
        }))
        .await;
        assert_eq!(
            codes(&ctx),
            vec![
                "invalid_email_address",
                "not_text_value",
                "invalid_enumeration_value",
                "not_decimal_value",
                "unsopported_bvl_value",
            ]
        );
    }

    #[tokio::test]
    async fn test_object_list_entries_are_indexed() {
        let (prepared, ctx) = create(json!({
            "email": "jane@example.com",
            "name": "Jane",
            "items": [{"sku": "A-1"}, {"qty": 2}]
        }))
        .await;
        assert_eq!(codes(&ctx), vec!["missing_required_field_value"]);
        assert_eq!(ctx.issues()[0].details.field, "items.sku");
        assert_eq!(ctx.issues()[0].details.index, Some(1));
        assert_eq!(prepared["items"][0], json!({"sku": "A-1", "qty": 1}));
    }

    #[tokio::test]
    async fn test_nested_object_defaults_are_seeded() {
        let (prepared, ctx) = create(json!({"email": "jane@example.com", "name": "Jane"})).await;
        assert!(!ctx.has_issues());
        assert_eq!(prepared["profile"], json!({"country": "NL"}));
    }

    #[tokio::test]
    async fn test_reference_requires_object_id() {
        let (prepared, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "manager": "64b7f0c2a1b2c3d4e5f60718"
        }))
        .await;
        assert!(!ctx.has_issues());
        assert_eq!(prepared["manager"], json!({"$oid": "64b7f0c2a1b2c3d4e5f60718"}));

        let (_, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "manager": "42"
        }))
        .await;
        assert_eq!(codes(&ctx), vec!["invalid_mongodb_id"]);
    }

    #[tokio::test]
    async fn test_encrypted_text_without_encryptor() {
        let (_, ctx) = create(json!({
            "email": "jane@example.com", "name": "Jane", "secret": "s3cret"
        }))
        .await;
        assert_eq!(codes(&ctx), vec!["encryption_failed"]);
    }

    // ==================== Update preparation ====================

    #[tokio::test]
    async fn test_update_null_handling() {
        let schema = fixture_schema();
        let users = schema.model(schema.model_by_name("users").unwrap());
        let mut ctx = timestamped(schema.dialect());
        let mut target = Map::new();

        let name = users.field("name").unwrap();
        name.prepare(&schema, Some(&Value::Null), &mut target, &mut ctx, false, None)
            .await;
        assert_eq!(codes(&ctx), vec!["invalid_required_field_value"]);

        let nickname = users.field("nickname").unwrap();
        nickname
            .prepare(&schema, Some(&Value::Null), &mut target, &mut ctx, false, None)
            .await;
        assert_eq!(target["nickname"], Value::Null);

        let created = users.field("createdAt").unwrap();
        created
            .prepare(&schema, None, &mut target, &mut ctx, false, None)
            .await;
        assert!(target.get("createdAt").is_none());

        let updated = users.field("updatedAt").unwrap();
        updated
            .prepare(&schema, None, &mut target, &mut ctx, false, None)
            .await;
        assert_eq!(target["updatedAt"], ctx.timestamp_value());
    }

    #[tokio::test]
    async fn test_read_only_field_ignores_updates() {
        let schema = fixture_schema();
        let users = schema.model(schema.model_by_name("users").unwrap());
        let mut ctx = timestamped(schema.dialect());
        let mut target = Map::new();
        users
            .field("email")
            .unwrap()
            .prepare(&schema, Some(&json!("new@example.com")), &mut target, &mut ctx, false, None)
            .await;
        assert!(target.is_empty());
        assert!(!ctx.has_issues());
    }
}
