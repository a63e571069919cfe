//! Error types for docql-core.
//!
//! Two shapes are used throughout the compiler:
//! - immediate client errors carrying one stable code and a message
//! - batched validation errors that carry every field issue found in a document

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stable codes for immediate, single-cause errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidValue,
    InvalidParameter,
    UnsupportedFunction,
    InvalidExpression,
    InvalidField,
    InvalidJoin,
    InvalidUpdateInstruction,
    InvalidRequiredFieldValue,
    ValidationErrors,
    MissingInputParameter,
    MissingMethod,
    DatabaseNotFound,
    ModelNotFound,
    SubmodelNotFound,
    AdapterNotFound,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidParameter => "invalid_parameter",
            ErrorCode::UnsupportedFunction => "unsupported_function",
            ErrorCode::InvalidExpression => "invalid_expression",
            ErrorCode::InvalidField => "invalid_field",
            ErrorCode::InvalidJoin => "invalid_join",
            ErrorCode::InvalidUpdateInstruction => "invalid_update_instruction",
            ErrorCode::InvalidRequiredFieldValue => "invalid_required_field_value",
            ErrorCode::ValidationErrors => "validation_errors",
            ErrorCode::MissingInputParameter => "missing_input_parameter",
            ErrorCode::MissingMethod => "missing_method",
            ErrorCode::DatabaseNotFound => "database_not_found",
            ErrorCode::ModelNotFound => "model_not_found",
            ErrorCode::SubmodelNotFound => "submodel_not_found",
            ErrorCode::AdapterNotFound => "adapter_not_found",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codes for accumulated field validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    MissingRequiredFieldValue,
    InvalidRequiredFieldValue,
    NotTextValue,
    MaxLengthThresholdExceeded,
    InvalidEmailAddress,
    InvalidUrl,
    InvalidPhoneNumber,
    NotBooleanValue,
    NotIntegerValue,
    NotDecimalValue,
    NotDateValue,
    NotDatetimeValue,
    NotTimeValue,
    NotEnumerationValue,
    InvalidEnumerationValue,
    NotGeopointValue,
    InvalidLongitudeValue,
    InvalidLatitudeValue,
    NotBufferValue,
    NotJsonValue,
    NotReferenceValue,
    InvalidMongodbId,
    NotArrayOfBasicValues,
    UnsupportedBasicValue,
    NotArrayValue,
    InvalidObjectArrayEntry,
    NotObjectValue,
    EncryptionFailed,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::MissingRequiredFieldValue => "missing_required_field_value",
            ValidationCode::InvalidRequiredFieldValue => "invalid_required_field_value",
            ValidationCode::NotTextValue => "not_text_value",
            ValidationCode::MaxLengthThresholdExceeded => "max_length_threshold_exceeded",
            ValidationCode::InvalidEmailAddress => "invalid_email_address",
            ValidationCode::InvalidUrl => "invalid_URL",
            ValidationCode::InvalidPhoneNumber => "invalid_phone_number",
            ValidationCode::NotBooleanValue => "not_boolean_value",
            ValidationCode::NotIntegerValue => "not_integer_value",
            ValidationCode::NotDecimalValue => "not_decimal_value",
            ValidationCode::NotDateValue => "not_date_value",
            ValidationCode::NotDatetimeValue => "not_datetime_value",
            ValidationCode::NotTimeValue => "not_time_value",
            ValidationCode::NotEnumerationValue => "not_enumeration_value",
            ValidationCode::InvalidEnumerationValue => "invalid_enumeration_value",
            ValidationCode::NotGeopointValue => "not_geopoint_value",
            ValidationCode::InvalidLongitudeValue => "invalid_longitude_value",
            ValidationCode::InvalidLatitudeValue => "invalid_latitude_value",
            ValidationCode::NotBufferValue => "not_buffer_value",
            ValidationCode::NotJsonValue => "not_json_value",
            ValidationCode::NotReferenceValue => "not_reference_value",
            ValidationCode::InvalidMongodbId => "invalid_mongodb_id",
            ValidationCode::NotArrayOfBasicValues => "not_array_of_basic_values",
            ValidationCode::UnsupportedBasicValue => "unsopported_bvl_value",
            ValidationCode::NotArrayValue => "not_array_value",
            ValidationCode::InvalidObjectArrayEntry => "invalid_object_array_entry",
            ValidationCode::NotObjectValue => "not_object_value",
            ValidationCode::EncryptionFailed => "encryption_failed",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValidationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Who caused an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    ClientError,
    ServerError,
}

/// Where in the input document an issue was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetails {
    pub field: String,
    /// Position inside an object-list field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Position of the document inside a batch create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<usize>,
}

/// One accumulated field validation failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub origin: ErrorOrigin,
    pub code: ValidationCode,
    pub details: IssueDetails,
}

impl ValidationIssue {
    pub fn new(
        code: ValidationCode,
        field: impl Into<String>,
        value: Option<Value>,
        index: Option<usize>,
    ) -> Self {
        Self {
            origin: ErrorOrigin::ClientError,
            code,
            details: IssueDetails {
                field: field.into(),
                index,
                value,
                entry: None,
            },
        }
    }

    /// Tag the issue with the position of its document in a batch
    pub fn with_entry(mut self, entry: usize) -> Self {
        self.details.entry = Some(entry);
        self
    }
}

#[derive(Error, Debug)]
pub enum DocqlError {
    #[error("{message}")]
    Client {
        code: ErrorCode,
        message: String,
        specifics: Vec<ValidationIssue>,
    },

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DocqlResult<T> = Result<T, DocqlError>;

impl DocqlError {
    /// Build an immediate client error
    pub fn client(code: ErrorCode, message: impl Into<String>) -> Self {
        DocqlError::Client {
            code,
            message: message.into(),
            specifics: Vec::new(),
        }
    }

    /// Build the batched validation error raised once per document (or batch)
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        DocqlError::Client {
            code: ErrorCode::ValidationErrors,
            message: "The input data provided has failed to pass validation rules".to_string(),
            specifics: issues,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            DocqlError::Client { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn specifics(&self) -> &[ValidationIssue] {
        match self {
            DocqlError::Client { specifics, .. } => specifics,
            _ => &[],
        }
    }
}

impl serde::Serialize for DocqlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
