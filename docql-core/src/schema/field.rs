//! Schema fields and their per-kind coercion rules.
//!
//! A field is owned by exactly one model in the schema arena and points back to it
//! through a [`ModelId`]. Object and object-list fields point at their sub-model the
//! same way, so the graph has no owning cycles.

use serde_json::{Map, Value};

use super::formats::{self, MAX_EMAIL_LENGTH, MAX_LINK_LENGTH, MAX_PHONE_LENGTH};
use super::meta::{Creator, FieldMeta};
use super::prepare::PrepareContext;
use super::{ModelId, Schema};
use crate::error::{ErrorOrigin, ValidationCode, ValidationIssue};
use crate::types::{Dialect, ReturnType};

/// Closed set of field kinds with the options each one carries
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Id,
    Text { max_length: usize },
    RichText,
    EncryptedText { max_length: usize },
    Email,
    Link,
    Phone,
    Boolean,
    Integer,
    Decimal { digits: u32 },
    CreatedAt,
    UpdatedAt,
    DateTime,
    Date,
    Time,
    Enum { options: Vec<String> },
    GeoPoint,
    Binary,
    Json,
    Reference { target: Option<ModelId> },
    BasicValuesList,
    ObjectList { sub_model: ModelId },
    Object { sub_model: ModelId },
    /// Virtual field standing for an aliased join result
    Join { target: ModelId },
    /// Virtual field naming an element property inside an array filter
    ArrayFilter,
}

impl FieldKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldKind::Id => "id",
            FieldKind::Text { .. } => "text",
            FieldKind::RichText => "rich-text",
            FieldKind::EncryptedText { .. } => "encrypted-text",
            FieldKind::Email => "email",
            FieldKind::Link => "link",
            FieldKind::Phone => "phone",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Decimal { .. } => "decimal",
            FieldKind::CreatedAt => "createdat",
            FieldKind::UpdatedAt => "updatedat",
            FieldKind::DateTime => "datetime",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Enum { .. } => "enum",
            FieldKind::GeoPoint => "geo-point",
            FieldKind::Binary => "binary",
            FieldKind::Json => "json",
            FieldKind::Reference { .. } => "reference",
            FieldKind::BasicValuesList => "basic-values-list",
            FieldKind::ObjectList { .. } => "object-list",
            FieldKind::Object { .. } => "object",
            FieldKind::Join { .. } => "join",
            FieldKind::ArrayFilter => "array-filter",
        }
    }

    pub fn return_type(&self) -> ReturnType {
        match self {
            FieldKind::Id | FieldKind::Reference { .. } => ReturnType::Id,
            FieldKind::Text { .. }
            | FieldKind::RichText
            | FieldKind::EncryptedText { .. }
            | FieldKind::Email
            | FieldKind::Link
            | FieldKind::Phone
            | FieldKind::Enum { .. } => ReturnType::Text,
            FieldKind::Boolean => ReturnType::Boolean,
            FieldKind::Integer | FieldKind::Decimal { .. } => ReturnType::Number,
            FieldKind::CreatedAt | FieldKind::UpdatedAt | FieldKind::DateTime => {
                ReturnType::Datetime
            }
            FieldKind::Date => ReturnType::Date,
            FieldKind::Time => ReturnType::Time,
            FieldKind::GeoPoint => ReturnType::Geopoint,
            FieldKind::Binary => ReturnType::Binary,
            FieldKind::Json => ReturnType::Json,
            FieldKind::BasicValuesList | FieldKind::ObjectList { .. } => ReturnType::Array,
            FieldKind::Object { .. } | FieldKind::Join { .. } => ReturnType::Object,
            FieldKind::ArrayFilter => ReturnType::Any,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    query_path: String,
    kind: FieldKind,
    required: bool,
    read_only: bool,
    creator: Creator,
    default_value: Option<Value>,
    model: ModelId,
}

impl Field {
    /// Build a field from metadata, `None` when the type tag is unknown.
    /// `resolve` maps a model iid to its arena id.
    pub(crate) fn from_meta(
        meta: &FieldMeta,
        model: ModelId,
        query_path: String,
        resolve: &dyn Fn(&str) -> Option<ModelId>,
    ) -> Result<Option<Self>, String> {
        let sub_model = |reference: &Option<super::meta::ModelRef>| -> Result<ModelId, String> {
            let iid = reference
                .as_ref()
                .map(|r| r.iid.as_str())
                .ok_or_else(|| format!("Field '{}' has no sub-model definition", meta.name))?;
            resolve(iid).ok_or_else(|| {
                format!("Cannot find the sub-model '{}' of field '{}'", iid, meta.name)
            })
        };

        let kind = match meta.field_type.as_str() {
            "id" => FieldKind::Id,
            "text" => FieldKind::Text {
                max_length: meta.text.as_ref().map_or(usize::MAX, |t| t.max_length),
            },
            "rich-text" => FieldKind::RichText,
            "encrypted-text" => FieldKind::EncryptedText {
                max_length: meta
                    .encrypted_text
                    .as_ref()
                    .map_or(usize::MAX, |t| t.max_length),
            },
            "email" => FieldKind::Email,
            "link" => FieldKind::Link,
            "phone" => FieldKind::Phone,
            "boolean" => FieldKind::Boolean,
            "integer" => FieldKind::Integer,
            "decimal" => FieldKind::Decimal {
                digits: meta.decimal.as_ref().map_or(2, |d| d.decimal_digits),
            },
            "createdat" => FieldKind::CreatedAt,
            "updatedat" => FieldKind::UpdatedAt,
            "datetime" => FieldKind::DateTime,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            "enum" => FieldKind::Enum {
                options: meta
                    .enum_options
                    .as_ref()
                    .map(|e| e.select_list.clone())
                    .unwrap_or_default(),
            },
            "geo-point" => FieldKind::GeoPoint,
            "binary" => FieldKind::Binary,
            "json" => FieldKind::Json,
            "reference" => FieldKind::Reference {
                target: meta.reference.as_ref().and_then(|r| resolve(&r.iid)),
            },
            "basic-values-list" => FieldKind::BasicValuesList,
            "object-list" => FieldKind::ObjectList {
                sub_model: sub_model(&meta.object_list)?,
            },
            "object" => FieldKind::Object {
                sub_model: sub_model(&meta.object)?,
            },
            _ => return Ok(None),
        };

        Ok(Some(Field {
            name: meta.name.clone(),
            query_path,
            kind,
            required: meta.required,
            read_only: meta.immutable,
            creator: meta.creator,
            default_value: meta.default_value.clone(),
            model,
        }))
    }

    /// Virtual field for a named join alias
    pub fn join_alias(alias: &str, target: ModelId, owner: ModelId) -> Self {
        Field {
            name: alias.to_string(),
            query_path: alias.to_string(),
            kind: FieldKind::Join { target },
            required: false,
            read_only: true,
            creator: Creator::System,
            default_value: None,
            model: owner,
        }
    }

    /// Virtual field for an unqualified array-filter property
    pub fn array_filter(name: &str, owner: ModelId) -> Self {
        Field {
            name: name.to_string(),
            query_path: name.to_string(),
            kind: FieldKind::ArrayFilter,
            required: false,
            read_only: true,
            creator: Creator::User,
            default_value: None,
            model: owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query_path(&self) -> &str {
        &self.query_path
    }

    pub(crate) fn set_query_path(&mut self, path: String) {
        self.query_path = path;
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn return_type(&self) -> ReturnType {
        self.kind.return_type()
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_system_field(&self) -> bool {
        self.creator == Creator::System
    }

    pub fn is_user_field(&self) -> bool {
        self.creator == Creator::User
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Integer | FieldKind::Decimal { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::BasicValuesList | FieldKind::ObjectList { .. }
        )
    }

    /// Sub-model of an object or object-list field
    pub fn sub_model(&self) -> Option<ModelId> {
        match self.kind {
            FieldKind::Object { sub_model } | FieldKind::ObjectList { sub_model } => {
                Some(sub_model)
            }
            _ => None,
        }
    }

    /// Whether any field reachable through nested objects carries a default
    pub fn has_fields_with_default_value(&self, schema: &Schema) -> bool {
        self.nested_any(schema, &|field| field.has_default_value())
    }

    pub fn has_required_fields(&self, schema: &Schema) -> bool {
        self.nested_any(schema, &|field| field.is_required())
    }

    fn nested_any(&self, schema: &Schema, check: &dyn Fn(&Field) -> bool) -> bool {
        let FieldKind::Object { sub_model } = self.kind else {
            return false;
        };
        schema.model(sub_model).fields().any(|field| {
            check(field)
                || (matches!(field.kind, FieldKind::Object { .. })
                    && field.nested_any(schema, check))
        })
    }

    pub(crate) fn add_issue(
        &self,
        ctx: &mut PrepareContext,
        code: ValidationCode,
        value: Option<&Value>,
        index: Option<usize>,
    ) {
        ctx.add_issue(ValidationIssue::new(
            code,
            self.query_path.clone(),
            value.filter(|v| !v.is_null()).cloned(),
            index,
        ));
    }

    /// Coerce and validate one raw value into `target`.
    ///
    /// `value` is `None` when the key is absent from the input and `Some(Null)` for an
    /// explicit null. Issues go to the context; nothing is thrown.
    pub async fn prepare(
        &self,
        schema: &Schema,
        value: Option<&Value>,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        is_create: bool,
        index: Option<usize>,
    ) {
        let accepted = if is_create {
            self.prepare_for_create(schema, value, target, ctx, index)
                .await
        } else {
            self.prepare_for_update(value, target, ctx, index).await
        };

        if !accepted {
            return;
        }

        let source = match value {
            Some(v) if !v.is_null() => Some(v),
            _ if is_create => self.default_value.as_ref(),
            _ => None,
        };

        match self.kind {
            FieldKind::Object { sub_model } => {
                if source.is_some() && !matches!(target.get(&self.name), Some(Value::Object(_))) {
                    return;
                }
                let nested_input = match source {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Map::new(),
                };
                let nested = schema
                    .prepare_field_values(sub_model, &nested_input, is_create, ctx, index)
                    .await;
                if source.is_some() || !nested.is_empty() {
                    target.insert(self.name.clone(), Value::Object(nested));
                }
            }
            FieldKind::ObjectList { sub_model } => {
                let Some(Value::Array(entries)) = source else {
                    return;
                };
                if !matches!(target.get(&self.name), Some(Value::Array(_))) {
                    return;
                }
                let mut prepared = Vec::with_capacity(entries.len());
                for (position, entry) in entries.iter().enumerate() {
                    let empty = Map::new();
                    let entry = entry.as_object().unwrap_or(&empty);
                    let nested = schema
                        .prepare_field_values(sub_model, entry, is_create, ctx, Some(position))
                        .await;
                    prepared.push(Value::Object(nested));
                }
                target.insert(self.name.clone(), Value::Array(prepared));
            }
            _ => {}
        }
    }

    /// Returns whether nested sub-model preparation should follow
    async fn prepare_for_create(
        &self,
        schema: &Schema,
        value: Option<&Value>,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) -> bool {
        match value {
            Some(v) if !v.is_null() => {
                self.set_value(v, target, ctx, true, index).await;
                true
            }
            _ => {
                if let Some(default) = &self.default_value {
                    self.set_value(default, target, ctx, true, index).await;
                    true
                } else if self.required {
                    if self.is_user_field() {
                        self.add_issue(
                            ctx,
                            ValidationCode::MissingRequiredFieldValue,
                            None,
                            index,
                        );
                    } else {
                        self.set_value(&Value::Null, target, ctx, true, index).await;
                    }
                    false
                } else if self.is_array() {
                    target.insert(self.name.clone(), Value::Array(Vec::new()));
                    false
                } else {
                    // Absent objects still recurse so nested defaults and required
                    // fields are applied
                    matches!(self.kind, FieldKind::Object { .. })
                        && (self.has_fields_with_default_value(schema)
                            || self.has_required_fields(schema))
                }
            }
        }
    }

    async fn prepare_for_update(
        &self,
        value: Option<&Value>,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) -> bool {
        match value {
            None | Some(Value::Null) => {
                if self.is_system_field() {
                    if matches!(self.kind, FieldKind::UpdatedAt) {
                        self.set_value(&Value::Null, target, ctx, false, index).await;
                    }
                } else if value.is_some() && self.required {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidRequiredFieldValue,
                        None,
                        index,
                    );
                } else if value.is_some() {
                    self.set_value(&Value::Null, target, ctx, false, index).await;
                }
                false
            }
            Some(v) => {
                if self.read_only && self.is_user_field() {
                    return false;
                }
                self.set_value(v, target, ctx, false, index).await;
                true
            }
        }
    }

    /// Per-kind coercion of a present value
    pub(crate) async fn set_value(
        &self,
        value: &Value,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        is_create: bool,
        index: Option<usize>,
    ) {
        if !is_create && self.read_only && self.is_user_field() {
            return;
        }
        let dialect = ctx.dialect();

        if !is_create && value.is_null() && !self.required {
            match self.kind {
                FieldKind::UpdatedAt => {}
                FieldKind::BasicValuesList | FieldKind::ObjectList { .. } => {
                    target.insert(self.name.clone(), Value::Array(Vec::new()));
                    return;
                }
                _ => {
                    target.insert(self.name.clone(), Value::Null);
                    return;
                }
            }
        }

        match &self.kind {
            FieldKind::Id | FieldKind::Join { .. } | FieldKind::ArrayFilter => {}
            FieldKind::Text { max_length } => {
                self.set_text(value, Some(*max_length), target, ctx, index)
            }
            FieldKind::RichText => self.set_text(value, None, target, ctx, index),
            FieldKind::EncryptedText { max_length } => {
                let Some(text) = self.text_or_issue(value, ctx, index) else {
                    return;
                };
                if text.chars().count() > *max_length {
                    self.add_issue(
                        ctx,
                        ValidationCode::MaxLengthThresholdExceeded,
                        Some(value),
                        index,
                    );
                    return;
                }
                if text.is_empty() {
                    return;
                }
                match ctx.encrypt(&text).await {
                    Ok(encrypted) => {
                        target.insert(self.name.clone(), Value::String(encrypted));
                    }
                    Err(reason) => {
                        tracing::warn!("Cannot encrypt value of '{}': {}", self.query_path, reason);
                        let mut issue = ValidationIssue::new(
                            ValidationCode::EncryptionFailed,
                            self.query_path.clone(),
                            None,
                            index,
                        );
                        issue.origin = ErrorOrigin::ServerError;
                        ctx.add_issue(issue);
                    }
                }
            }
            FieldKind::Email => self.set_formatted(
                value,
                MAX_EMAIL_LENGTH,
                formats::is_email,
                ValidationCode::InvalidEmailAddress,
                target,
                ctx,
                index,
            ),
            FieldKind::Link => self.set_formatted(
                value,
                MAX_LINK_LENGTH,
                formats::is_link,
                ValidationCode::InvalidUrl,
                target,
                ctx,
                index,
            ),
            FieldKind::Phone => self.set_formatted(
                value,
                MAX_PHONE_LENGTH,
                formats::is_mobile_phone,
                ValidationCode::InvalidPhoneNumber,
                target,
                ctx,
                index,
            ),
            FieldKind::Boolean => match value {
                Value::Bool(_) => {
                    target.insert(self.name.clone(), value.clone());
                }
                _ => self.add_issue(ctx, ValidationCode::NotBooleanValue, Some(value), index),
            },
            FieldKind::Integer => match value.as_f64() {
                Some(number) => {
                    let rounded = formats::round_half_up(number, 0);
                    target.insert(self.name.clone(), formats::number_value(rounded));
                }
                None => self.add_issue(ctx, ValidationCode::NotIntegerValue, Some(value), index),
            },
            FieldKind::Decimal { digits } => match value.as_f64() {
                Some(number) => {
                    let rounded = formats::round_half_up(number, *digits);
                    target.insert(self.name.clone(), formats::number_value(rounded));
                }
                None => self.add_issue(ctx, ValidationCode::NotDecimalValue, Some(value), index),
            },
            FieldKind::CreatedAt => {
                if is_create {
                    target.insert(self.name.clone(), ctx.timestamp_value());
                }
            }
            FieldKind::UpdatedAt => {
                target.insert(self.name.clone(), ctx.timestamp_value());
            }
            FieldKind::DateTime | FieldKind::Date => {
                let code = if matches!(self.kind, FieldKind::Date) {
                    ValidationCode::NotDateValue
                } else {
                    ValidationCode::NotDatetimeValue
                };
                if is_create && value.as_str() == Some("$$NOW") {
                    target.insert(self.name.clone(), ctx.timestamp_value());
                    return;
                }
                match value.as_str().and_then(formats::parse_datetime) {
                    Some(parsed) => {
                        target.insert(
                            self.name.clone(),
                            formats::encode_datetime(parsed, dialect),
                        );
                    }
                    None => self.add_issue(ctx, code, Some(value), index),
                }
            }
            FieldKind::Time => match value.as_str().and_then(formats::parse_time) {
                Some(parsed) => {
                    target.insert(
                        self.name.clone(),
                        Value::String(parsed.format("%H:%M:%S").to_string()),
                    );
                }
                None => self.add_issue(ctx, ValidationCode::NotTimeValue, Some(value), index),
            },
            FieldKind::Enum { options } => {
                let Some(text) = formats::scalar_to_string(value) else {
                    self.add_issue(ctx, ValidationCode::NotEnumerationValue, Some(value), index);
                    return;
                };
                if text.is_empty() && self.required {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidRequiredFieldValue,
                        Some(value),
                        index,
                    );
                } else if !options.iter().any(|option| *option == text) {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidEnumerationValue,
                        Some(value),
                        index,
                    );
                } else {
                    target.insert(self.name.clone(), Value::String(text));
                }
            }
            FieldKind::GeoPoint => self.set_geo_point(value, target, ctx, index),
            FieldKind::Binary => match value {
                Value::String(encoded) if formats::is_base64(encoded) => {
                    target.insert(
                        self.name.clone(),
                        formats::encode_binary(encoded, dialect),
                    );
                }
                Value::Null => {
                    target.insert(self.name.clone(), Value::Null);
                }
                _ => self.add_issue(ctx, ValidationCode::NotBufferValue, Some(value), index),
            },
            FieldKind::Json => match value {
                Value::Object(_) | Value::Array(_) | Value::Null => {
                    let stored = if dialect.is_document() {
                        value.clone()
                    } else {
                        Value::String(value.to_string())
                    };
                    target.insert(self.name.clone(), stored);
                }
                _ => self.add_issue(ctx, ValidationCode::NotJsonValue, Some(value), index),
            },
            FieldKind::Reference { .. } => {
                let Some(text) = formats::scalar_to_string(value) else {
                    self.add_issue(ctx, ValidationCode::NotReferenceValue, Some(value), index);
                    return;
                };
                let text = text.trim();
                if text.is_empty() && self.required {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidRequiredFieldValue,
                        Some(value),
                        index,
                    );
                } else if dialect == Dialect::MongoDb {
                    if formats::is_object_id(text) {
                        target.insert(self.name.clone(), formats::encode_object_id(text));
                    } else {
                        self.add_issue(ctx, ValidationCode::InvalidMongodbId, Some(value), index);
                    }
                } else {
                    target.insert(self.name.clone(), value.clone());
                }
            }
            FieldKind::BasicValuesList => {
                let Value::Array(entries) = value else {
                    self.add_issue(
                        ctx,
                        ValidationCode::NotArrayOfBasicValues,
                        Some(value),
                        index,
                    );
                    return;
                };
                if entries.is_empty() && self.required {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidRequiredFieldValue,
                        Some(value),
                        index,
                    );
                    return;
                }
                if let Some(bad) = entries
                    .iter()
                    .find(|entry| entry.is_object() || entry.is_array())
                {
                    self.add_issue(ctx, ValidationCode::UnsupportedBasicValue, Some(bad), index);
                    return;
                }
                target.insert(self.name.clone(), value.clone());
            }
            FieldKind::ObjectList { .. } => {
                let Value::Array(entries) = value else {
                    self.add_issue(ctx, ValidationCode::NotArrayValue, Some(value), index);
                    return;
                };
                if let Some(bad) = entries.iter().find(|entry| !entry.is_object()) {
                    self.add_issue(
                        ctx,
                        ValidationCode::InvalidObjectArrayEntry,
                        Some(bad),
                        index,
                    );
                    return;
                }
                target.insert(self.name.clone(), Value::Array(Vec::new()));
            }
            FieldKind::Object { .. } => {
                if value.is_object() {
                    target.insert(self.name.clone(), Value::Object(Map::new()));
                } else {
                    self.add_issue(ctx, ValidationCode::NotObjectValue, Some(value), index);
                }
            }
        }
    }

    fn text_or_issue(
        &self,
        value: &Value,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) -> Option<String> {
        let Some(text) = formats::scalar_to_string(value) else {
            self.add_issue(ctx, ValidationCode::NotTextValue, Some(value), index);
            return None;
        };
        if text.is_empty() && self.required {
            self.add_issue(
                ctx,
                ValidationCode::InvalidRequiredFieldValue,
                Some(value),
                index,
            );
            return None;
        }
        Some(text)
    }

    fn set_text(
        &self,
        value: &Value,
        max_length: Option<usize>,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) {
        let Some(text) = self.text_or_issue(value, ctx, index) else {
            return;
        };
        if max_length.is_some_and(|max| text.chars().count() > max) {
            self.add_issue(
                ctx,
                ValidationCode::MaxLengthThresholdExceeded,
                Some(value),
                index,
            );
            return;
        }
        target.insert(self.name.clone(), Value::String(text));
    }

    #[allow(clippy::too_many_arguments)]
    fn set_formatted(
        &self,
        value: &Value,
        max_length: usize,
        is_valid: fn(&str) -> bool,
        invalid: ValidationCode,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) {
        let Some(text) = self.text_or_issue(value, ctx, index) else {
            return;
        };
        let text = text.trim();
        if text.chars().count() > max_length {
            self.add_issue(
                ctx,
                ValidationCode::MaxLengthThresholdExceeded,
                Some(value),
                index,
            );
        } else if !is_valid(text) {
            self.add_issue(ctx, invalid, Some(value), index);
        } else {
            target.insert(self.name.clone(), Value::String(text.to_string()));
        }
    }

    fn set_geo_point(
        &self,
        value: &Value,
        target: &mut Map<String, Value>,
        ctx: &mut PrepareContext,
        index: Option<usize>,
    ) {
        let coordinates = match value.as_array() {
            Some(pair) if pair.len() == 2 => pair,
            _ => {
                self.add_issue(ctx, ValidationCode::NotGeopointValue, Some(value), index);
                return;
            }
        };
        let Some(lng) = coordinates[0].as_f64().filter(|v| (-180.0..=180.0).contains(v)) else {
            self.add_issue(ctx, ValidationCode::InvalidLongitudeValue, Some(value), index);
            return;
        };
        let Some(lat) = coordinates[1].as_f64().filter(|v| (-90.0..=90.0).contains(v)) else {
            self.add_issue(ctx, ValidationCode::InvalidLatitudeValue, Some(value), index);
            return;
        };
        target.insert(
            self.name.clone(),
            formats::encode_geo_point(lng, lat, ctx.dialect()),
        );
    }
}
