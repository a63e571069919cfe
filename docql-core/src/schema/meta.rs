//! Metadata documents supplied by the metadata provider.
//!
//! These mirror the platform's database/model/field definitions and are only read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Dialect;

/// Database definition with every model and sub-model it contains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub dialect: Dialect,
    #[serde(default)]
    pub models: Vec<ModelMeta>,
}

/// How a model is embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Top-level collection/table
    #[serde(rename = "model")]
    Model,
    /// Sub-document of an `object` field
    #[serde(rename = "sub-model-object")]
    SubModelObject,
    /// Element of an `object-list` field
    #[serde(rename = "sub-model-list")]
    SubModelList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMeta {
    pub iid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

/// Who maintains a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Creator {
    System,
    User,
}

impl Default for Creator {
    fn default() -> Self {
        Self::User
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthOptions {
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalOptions {
    pub decimal_digits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumOptions {
    #[serde(default)]
    pub select_list: Vec<String>,
}

/// Pointer to another model by its internal id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRef {
    pub iid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub query_path: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub creator: Creator,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub text: Option<LengthOptions>,
    #[serde(default)]
    pub encrypted_text: Option<LengthOptions>,
    #[serde(default)]
    pub decimal: Option<DecimalOptions>,
    #[serde(default, rename = "enum")]
    pub enum_options: Option<EnumOptions>,
    #[serde(default)]
    pub object: Option<ModelRef>,
    #[serde(default)]
    pub object_list: Option<ModelRef>,
    #[serde(default)]
    pub reference: Option<ModelRef>,
}
