//! Typed expression tree for conditions.
//!
//! Trees are built by the condition compiler, validated once, then rendered into
//! MongoDB aggregation syntax (`get_query`) or into the plain query syntax that
//! `$pull` conditions and array filters use (`get_pull_query`).

pub mod custom;
mod function;

use serde_json::{Map, Value};

pub use function::Function;

use crate::error::DocqlResult;
use crate::schema::{Field, ModelId};
use crate::types::{Dialect, ExpressionType, ReturnType};

/// Maps a base-model field path to a pipeline variable name
pub type PathResolver<'r> = &'r mut dyn FnMut(&str) -> String;

/// Borrow an optional resolver for one nested render call
pub(crate) fn reborrow<'s>(resolver: &'s mut Option<PathResolver<'_>>) -> Option<PathResolver<'s>> {
    match resolver {
        Some(resolve) => Some(&mut **resolve as &mut dyn FnMut(&str) -> String),
        None => None,
    }
}

/// How a referenced field was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    None,
    /// Through one reference field listed in the join set
    Simple,
    /// Through an explicit named join alias
    Complex,
}

/// Where a pull condition is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTarget {
    /// Elements are documents; conditions are keyed by field name
    Document,
    /// Elements are scalars; conditions are bare operator maps
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticValue {
    value: Value,
}

impl StaticValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn return_type(&self) -> ReturnType {
        match &self.value {
            Value::Null => ReturnType::Null,
            Value::Bool(_) => ReturnType::Boolean,
            Value::Number(_) => ReturnType::Number,
            Value::String(_) => ReturnType::Text,
            Value::Array(_) => ReturnType::Array,
            Value::Object(_) => ReturnType::Object,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    field: Field,
    path: String,
    join: JoinType,
    model: ModelId,
}

impl FieldValue {
    pub fn new(field: Field, path: impl Into<String>, join: JoinType, model: ModelId) -> Self {
        Self {
            field,
            path: path.into(),
            join,
            model,
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn join(&self) -> JoinType {
        self.join
    }

    /// Model that owns the terminal path segment
    pub fn model(&self) -> ModelId {
        self.model
    }

    fn to_mongo(&self, resolver: Option<PathResolver<'_>>) -> Value {
        match (resolver, self.join) {
            (Some(_), JoinType::Complex) => {
                let local = self
                    .path
                    .split_once('.')
                    .map_or(self.path.as_str(), |(_, rest)| rest);
                Value::String(format!("${}", local))
            }
            (Some(resolve), _) => Value::String(format!("${}", resolve(&self.path))),
            (None, _) => Value::String(format!("${}", self.path)),
        }
    }
}

/// Field addressed relative to an array element
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayFilterFieldValue {
    name: String,
    field: Option<Field>,
}

impl ArrayFilterFieldValue {
    pub fn new(name: impl Into<String>, field: Option<Field>) -> Self {
        Self {
            name: name.into(),
            field,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    pub fn return_type(&self) -> ReturnType {
        self.field
            .as_ref()
            .map_or(ReturnType::Any, |field| field.return_type())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    entries: Vec<Expression>,
}

impl ArrayValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: Expression) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Expression] {
        &self.entries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Static(StaticValue),
    Field(FieldValue),
    ArrayFilterField(ArrayFilterFieldValue),
    Array(ArrayValue),
    Function(Function),
}

impl Expression {
    pub fn literal(value: Value) -> Self {
        Expression::Static(StaticValue::new(value))
    }

    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Expression::Static(_) | Expression::Array(_) => ExpressionType::Static,
            Expression::Field(_) => ExpressionType::Field,
            Expression::ArrayFilterField(_) => ExpressionType::ArrayField,
            Expression::Function(_) => ExpressionType::Function,
        }
    }

    pub fn return_type(&self) -> ReturnType {
        match self {
            Expression::Static(value) => value.return_type(),
            Expression::Field(value) => value.field.return_type(),
            Expression::ArrayFilterField(value) => value.return_type(),
            Expression::Array(_) => ReturnType::Array,
            Expression::Function(function) => function.definition().returns,
        }
    }

    /// Check arity, parameter types and dialect support of the whole tree
    pub fn validate(&self, dialect: Dialect) -> DocqlResult<()> {
        match self {
            Expression::Function(function) => function.validate(dialect),
            Expression::Array(array) => array
                .entries
                .iter()
                .try_for_each(|entry| entry.validate(dialect)),
            _ => Ok(()),
        }
    }

    /// Stricter validation for `$pull` conditions and array filters
    pub fn validate_for_pull(&self, dialect: Dialect) -> DocqlResult<()> {
        match self {
            Expression::Function(function) => function.validate_for_pull(dialect),
            _ => Ok(()),
        }
    }

    /// Render as an aggregation expression. Relational dialects have no
    /// code generation and yield `None`.
    pub fn get_query(&self, dialect: Dialect, resolver: Option<PathResolver<'_>>) -> Option<Value> {
        if !dialect.is_document() {
            tracing::warn!("No query generation available for {} databases", dialect);
            return None;
        }
        Some(self.to_mongo(resolver))
    }

    pub(crate) fn to_mongo(&self, resolver: Option<PathResolver<'_>>) -> Value {
        match self {
            Expression::Static(value) => value.value.clone(),
            Expression::Field(value) => value.to_mongo(resolver),
            Expression::ArrayFilterField(value) => Value::String(format!("${}", value.name)),
            Expression::Array(array) => {
                let mut resolver = resolver;
                Value::Array(
                    array
                        .entries
                        .iter()
                        .map(|entry| entry.to_mongo(reborrow(&mut resolver)))
                        .collect(),
                )
            }
            Expression::Function(function) => function.to_mongo(resolver),
        }
    }

    /// Render as a query-language condition for `$pull` or `arrayFilters`
    pub fn get_pull_query(&self, dialect: Dialect, target: PullTarget) -> Option<Value> {
        if !dialect.is_document() {
            tracing::warn!("No pull query generation available for {} databases", dialect);
            return None;
        }
        Some(self.to_pull(target))
    }

    pub(crate) fn to_pull(&self, target: PullTarget) -> Value {
        match self {
            Expression::Function(function) => function.to_pull(target),
            Expression::Array(array) => Value::Array(
                array
                    .entries
                    .iter()
                    .map(|entry| entry.to_pull(target))
                    .collect(),
            ),
            Expression::Static(value) => value.value.clone(),
            Expression::Field(value) => Value::String(value.path.clone()),
            Expression::ArrayFilterField(value) => Value::String(value.name.clone()),
        }
    }

    /// Name a pull condition is keyed by: the element-relative name when one exists
    pub(crate) fn pull_key(&self) -> Option<&str> {
        match self {
            Expression::Field(value) => Some(value.path.as_str()),
            Expression::ArrayFilterField(value) => Some(value.name.as_str()),
            _ => None,
        }
    }

    /// Whether any node references a field reached through a join
    pub fn has_join_field_values(&self) -> bool {
        match self {
            Expression::Field(value) => value.join != JoinType::None,
            Expression::Array(array) => array.entries.iter().any(Expression::has_join_field_values),
            Expression::Function(function) => function
                .params()
                .iter()
                .any(Expression::has_join_field_values),
            _ => false,
        }
    }
}

impl From<Function> for Expression {
    fn from(function: Function) -> Self {
        Expression::Function(function)
    }
}

/// Merge `right` into `left` when both are operator maps, for pull `and` on scalars
pub(crate) fn merge_operator_maps(left: &mut Map<String, Value>, right: Value) {
    if let Value::Object(map) = right {
        for (key, value) in map {
            left.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests;
