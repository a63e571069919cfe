//! Closed enumerations shared by the expression tree, catalog and schema.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    Field,
    Static,
    Function,
    ArrayField,
}

impl ExpressionType {
    /// Whether the node references stored data (a field or an array-element field)
    pub fn is_field_reference(self) -> bool {
        matches!(self, ExpressionType::Field | ExpressionType::ArrayField)
    }
}

/// Value type an expression evaluates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Number,
    Text,
    Boolean,
    Object,
    Datetime,
    Null,
    Binary,
    Json,
    Id,
    Array,
    Geopoint,
    Undefined,
    Any,
    Primitive,
    Date,
    Time,
    StaticBoolean,
}

impl ReturnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnType::Number => "number",
            ReturnType::Text => "text",
            ReturnType::Boolean => "boolean",
            ReturnType::Object => "object",
            ReturnType::Datetime => "datetime",
            ReturnType::Null => "null",
            ReturnType::Binary => "binary",
            ReturnType::Json => "json",
            ReturnType::Id => "id",
            ReturnType::Array => "array",
            ReturnType::Geopoint => "geopoint",
            ReturnType::Undefined => "undefined",
            ReturnType::Any => "any",
            ReturnType::Primitive => "primitive",
            ReturnType::Date => "date",
            ReturnType::Time => "time",
            ReturnType::StaticBoolean => "static boolean",
        }
    }

    /// Check whether a parameter of type `actual` (of kind `kind`) fits an expected slot.
    ///
    /// `Any` on either side always fits, `Primitive` rejects structured values,
    /// `StaticBoolean` accepts boolean expressions or any literal, and a date value
    /// fits a datetime slot since both are stored as full dates.
    pub fn accepts(self, actual: ReturnType, kind: ExpressionType) -> bool {
        match self {
            ReturnType::Any => true,
            ReturnType::Primitive => !matches!(
                actual,
                ReturnType::Object | ReturnType::Array | ReturnType::Binary | ReturnType::Json
            ),
            ReturnType::StaticBoolean => {
                actual == ReturnType::Boolean || kind == ExpressionType::Static
            }
            ReturnType::Datetime if actual == ReturnType::Date => true,
            expected => actual == ReturnType::Any || actual == expected,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database dialects a model can be bound to.
///
/// Only `MongoDB` has code generation; the relational dialects are declared so that
/// metadata and catalog tables can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "MongoDB")]
    MongoDb,
    #[serde(rename = "PostgreSQL")]
    PostgreSql,
    #[serde(rename = "MySQL")]
    MySql,
    #[serde(rename = "SQL Server")]
    SqlServer,
    #[serde(rename = "Oracle")]
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::MongoDb,
        Dialect::PostgreSql,
        Dialect::MySql,
        Dialect::SqlServer,
        Dialect::Oracle,
    ];

    /// Position of the dialect in per-dialect lookup tables
    pub fn index(self) -> usize {
        match self {
            Dialect::MongoDb => 0,
            Dialect::PostgreSql => 1,
            Dialect::MySql => 2,
            Dialect::SqlServer => 3,
            Dialect::Oracle => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::MongoDb => "MongoDB",
            Dialect::PostgreSql => "PostgreSQL",
            Dialect::MySql => "MySQL",
            Dialect::SqlServer => "SQL Server",
            Dialect::Oracle => "Oracle",
        }
    }

    pub fn is_document(self) -> bool {
        self == Dialect::MongoDb
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
