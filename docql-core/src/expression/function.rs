use serde_json::{json, Map, Value};

use super::{custom, merge_operator_maps, reborrow, Expression, PathResolver, PullTarget};
use crate::catalog::{Arity, FunctionDef, Mapping};
use crate::error::{DocqlError, DocqlResult, ErrorCode};
use crate::types::Dialect;

/// Functions allowed in pull conditions and array filters
const PULL_FUNCTIONS: &[&str] = &["eq", "neq", "lt", "lte", "gt", "gte", "in", "nin", "and", "exists"];

/// Operator function node
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    definition: FunctionDef,
    params: Vec<Expression>,
}

impl Function {
    pub fn new(definition: FunctionDef) -> Self {
        Self {
            definition,
            params: Vec::new(),
        }
    }

    pub fn with_params(definition: FunctionDef, params: Vec<Expression>) -> Self {
        Self { definition, params }
    }

    pub fn add_param(&mut self, param: Expression) {
        self.params.push(param);
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    pub fn definition(&self) -> &FunctionDef {
        &self.definition
    }

    pub fn params(&self) -> &[Expression] {
        &self.params
    }

    pub(crate) fn validate(&self, dialect: Dialect) -> DocqlResult<()> {
        if self.definition.mapping(dialect) == Mapping::NotAvailable {
            return Err(DocqlError::client(
                ErrorCode::UnsupportedFunction,
                format!(
                    "The '{}' function is not supported in {} databases",
                    self.name(),
                    dialect
                ),
            ));
        }
        for param in &self.params {
            param.validate(dialect)?;
        }
        self.check_arity()?;
        self.check_types()
    }

    /// `not` applied to a single `exists` call, rendered as `$exists: false`
    fn negated_exists(&self) -> Option<&Function> {
        match (self.name(), self.params.as_slice()) {
            ("not", [Expression::Function(inner)]) if inner.name() == "exists" => Some(inner),
            _ => None,
        }
    }

    pub(crate) fn validate_for_pull(&self, dialect: Dialect) -> DocqlResult<()> {
        if let Some(inner) = self.negated_exists() {
            inner.validate_for_pull(dialect)?;
            return self.validate(dialect);
        }
        if !PULL_FUNCTIONS.contains(&self.name()) {
            return Err(DocqlError::client(
                ErrorCode::UnsupportedFunction,
                format!(
                    "The '{}' function cannot be used in pull conditions or array filters",
                    self.definition.operator()
                ),
            ));
        }
        for param in &self.params {
            param.validate_for_pull(dialect)?;
        }
        self.validate(dialect)?;

        if self.name() == "and" {
            return Ok(());
        }
        if let Some(first) = self.params.first() {
            if !first.expression_type().is_field_reference() {
                return Err(DocqlError::client(
                    ErrorCode::InvalidParameter,
                    format!(
                        "The first input parameter of the '{}' function needs to be a field reference in pull conditions and array filters",
                        self.definition.operator()
                    ),
                ));
            }
        }
        if let Some(second) = self.params.get(1) {
            if !is_literal(second) {
                return Err(DocqlError::client(
                    ErrorCode::InvalidParameter,
                    format!(
                        "The second input parameter of the '{}' function needs to be a static value or an array of static values in pull conditions and array filters",
                        self.definition.operator()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_arity(&self) -> DocqlResult<()> {
        let count = self.params.len();
        if self.definition.arity.accepts(count) {
            return Ok(());
        }
        let expected = match self.definition.arity {
            Arity::Exact(0) => "no input parameters".to_string(),
            Arity::Exact(1) => "1 input parameter".to_string(),
            Arity::Exact(n) => format!("{} input parameters", n),
            Arity::Variadic => "at least two input parameters".to_string(),
            Arity::Range(min, max) => format!("{} to {} input parameters", min, max),
        };
        Err(DocqlError::client(
            ErrorCode::InvalidParameter,
            format!(
                "The '{}' function expects {} but received {}",
                self.name(),
                expected,
                count
            ),
        ))
    }

    fn check_types(&self) -> DocqlResult<()> {
        for (position, param) in self.params.iter().enumerate() {
            let expected = self.definition.params.expected(position);
            let actual = param.return_type();
            if !expected.accepts(actual, param.expression_type()) {
                return Err(DocqlError::client(
                    ErrorCode::InvalidParameter,
                    format!(
                        "The '{}' function expects a '{}' value as its {} input parameter but received a '{}' value",
                        self.name(),
                        expected,
                        ordinal(position + 1),
                        actual
                    ),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn to_mongo(&self, resolver: Option<PathResolver<'_>>) -> Value {
        let mut resolver = resolver;
        let args: Vec<Value> = self
            .params
            .iter()
            .map(|param| param.to_mongo(reborrow(&mut resolver)))
            .collect();

        match self.definition.mapping(Dialect::MongoDb) {
            Mapping::Native(op) => {
                if self.definition.arity == Arity::Exact(1) {
                    let mut args = args;
                    json!({ op: args.pop().unwrap_or(Value::Null) })
                } else {
                    json!({ op: args })
                }
            }
            Mapping::Custom(op) => custom::render(op, args, &self.params),
            Mapping::NotAvailable => Value::Null,
        }
    }

    pub(crate) fn to_pull(&self, target: PullTarget) -> Value {
        if let Some(inner) = self.negated_exists() {
            return inner.exists_pull(target, false);
        }
        if self.name() == "exists" {
            return self.exists_pull(target, true);
        }
        if self.name() == "and" {
            let parts: Vec<Value> = self.params.iter().map(|p| p.to_pull(target)).collect();
            return match target {
                PullTarget::Document => json!({ "$and": parts }),
                PullTarget::Value => {
                    let mut merged = Map::new();
                    for part in parts {
                        merge_operator_maps(&mut merged, part);
                    }
                    Value::Object(merged)
                }
            };
        }

        let operator = match self.name() {
            "neq" => "$ne".to_string(),
            name => format!("${}", name),
        };
        let operand = self
            .params
            .get(1)
            .map_or(Value::Null, |param| param.to_pull(target));
        self.keyed(target, json!({ operator: operand }))
    }

    fn exists_pull(&self, target: PullTarget, present: bool) -> Value {
        self.keyed(target, json!({ "$exists": present }))
    }

    fn keyed(&self, target: PullTarget, condition: Value) -> Value {
        match (target, self.params.first().and_then(Expression::pull_key)) {
            (PullTarget::Document, Some(key)) => json!({ key: condition }),
            _ => condition,
        }
    }
}

/// Static value or array made only of static values
fn is_literal(expression: &Expression) -> bool {
    match expression {
        Expression::Static(_) => true,
        Expression::Array(array) => array.entries().iter().all(is_literal),
        _ => false,
    }
}

fn ordinal(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (1, n) if n != 11 => "st",
        (2, n) if n != 12 => "nd",
        (3, n) if n != 13 => "rd",
        _ => "th",
    };
    format!("{}{}", position, suffix)
}
