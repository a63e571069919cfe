//! Compiles JSON conditions into validated expression trees.
//!
//! Keys starting with `$` name catalog operators; any other key is a field path. A
//! field key with a plain value is an equality test, a field key whose value is an
//! object of operators applies each operator with the field as first parameter, and
//! several keys on one object are AND-combined.

use serde_json::{Map, Value};

use docql_core::{
    ArrayFilterFieldValue, ArrayValue, DocqlError, DocqlResult, ErrorCode, Expression,
    FieldKind, FieldValue, Function, FunctionDef, FunctionRegistry, ModelId, ModelType, Schema,
};

use super::definition::JoinDef;
use super::paths::resolve_field;

/// Which grammar the compiled condition is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionMode {
    /// `where` clauses and join conditions
    Query,
    /// `$pull` conditions
    Pull,
    /// Update array filters; bare element property names are allowed
    ArrayFilter,
}

pub struct ConditionCompiler<'a> {
    schema: &'a Schema,
    registry: &'a FunctionRegistry,
    model: ModelId,
    joins: &'a [JoinDef],
    mode: ConditionMode,
}

impl<'a> ConditionCompiler<'a> {
    pub fn new(
        schema: &'a Schema,
        registry: &'a FunctionRegistry,
        model: ModelId,
        joins: &'a [JoinDef],
        mode: ConditionMode,
    ) -> Self {
        Self {
            schema,
            registry,
            model,
            joins,
            mode,
        }
    }

    /// Compile and validate a condition object
    pub fn compile(&self, condition: &Value) -> DocqlResult<Expression> {
        let expression = self.compile_object(condition)?;
        match self.mode {
            ConditionMode::Query => expression.validate(self.schema.dialect())?,
            ConditionMode::Pull | ConditionMode::ArrayFilter => {
                expression.validate_for_pull(self.schema.dialect())?
            }
        }
        tracing::debug!("Compiled {:?} condition {}", self.mode, condition);
        Ok(expression)
    }

    fn compile_object(&self, condition: &Value) -> DocqlResult<Expression> {
        let Value::Object(map) = condition else {
            return Err(invalid_expression(format!(
                "Conditions need to be JSON objects but received '{}'",
                condition
            )));
        };

        let mut entries = map.iter();
        match (entries.next(), map.len()) {
            (None, _) => Err(invalid_expression("Conditions cannot be empty objects")),
            (Some((key, value)), 1) => self.compile_entry(key, value),
            _ => {
                let mut and = Function::new(self.function("and")?);
                for (key, value) in map {
                    and.add_param(self.compile_entry(key, value)?);
                }
                Ok(and.into())
            }
        }
    }

    fn compile_entry(&self, key: &str, value: &Value) -> DocqlResult<Expression> {
        if key.starts_with('$') {
            let mut function = Function::new(self.operator(key)?);
            match value {
                Value::Array(params) => {
                    for param in params {
                        function.add_param(self.compile_param(param)?);
                    }
                }
                param => function.add_param(self.compile_param(param)?),
            }
            return Ok(function.into());
        }

        let subject = self.field_expression(key)?.ok_or_else(|| {
            invalid_expression(format!(
                "'{}' is neither a known operator nor a field of the '{}' model",
                key,
                self.schema.model(self.model).name()
            ))
        })?;

        match value {
            Value::Object(map) if is_operator_map(map) => {
                let mut parts = Vec::with_capacity(map.len());
                for (operator, operand) in map {
                    parts.push(self.apply_operator(subject.clone(), operator, operand)?);
                }
                if parts.len() == 1 {
                    return Ok(parts.remove(0));
                }
                Ok(Function::with_params(self.function("and")?, parts).into())
            }
            literal => Ok(Function::with_params(
                self.function("eq")?,
                vec![subject, self.compile_operand(literal)?],
            )
            .into()),
        }
    }

    /// `{field: {$op: operand}}`
    fn apply_operator(
        &self,
        subject: Expression,
        operator: &str,
        operand: &Value,
    ) -> DocqlResult<Expression> {
        let definition = self.operator(operator)?;
        if definition.name == "exists" {
            let exists: Expression = Function::with_params(definition, vec![subject]).into();
            return match operand {
                Value::Bool(false) => {
                    Ok(Function::with_params(self.function("not")?, vec![exists]).into())
                }
                _ => Ok(exists),
            };
        }
        Ok(Function::with_params(definition, vec![subject, self.compile_operand(operand)?]).into())
    }

    /// Parameter listed directly under an operator; only `$`-prefixed strings are
    /// field references
    fn compile_param(&self, value: &Value) -> DocqlResult<Expression> {
        match value {
            Value::String(text) if text.starts_with('$') => self.dollar_reference(text),
            Value::Array(entries) => self.compile_array(entries),
            Value::Object(_) => self.compile_object(value),
            _ => Ok(Expression::literal(value.clone())),
        }
    }

    /// Value compared against a field; only `$`-prefixed strings are references
    fn compile_operand(&self, value: &Value) -> DocqlResult<Expression> {
        match value {
            Value::String(text) if text.starts_with('$') => self.dollar_reference(text),
            Value::Array(entries) => self.compile_array(entries),
            Value::Object(map) if is_operator_map(map) => self.compile_object(value),
            _ => Ok(Expression::literal(value.clone())),
        }
    }

    fn compile_array(&self, entries: &[Value]) -> DocqlResult<Expression> {
        let mut array = ArrayValue::new();
        for entry in entries {
            array.add_entry(self.compile_operand(entry)?);
        }
        Ok(Expression::Array(array))
    }

    fn dollar_reference(&self, text: &str) -> DocqlResult<Expression> {
        self.field_expression(&text[1..])?.ok_or_else(|| {
            invalid_expression(format!(
                "Cannot resolve the field reference '{}' in the '{}' model",
                text,
                self.schema.model(self.model).name()
            ))
        })
    }

    fn field_expression(&self, path: &str) -> DocqlResult<Option<Expression>> {
        let joins = match self.mode {
            ConditionMode::Query => self.joins,
            ConditionMode::Pull | ConditionMode::ArrayFilter => &[],
        };
        let resolved = resolve_field(self.schema, self.model, path, joins);

        let expression = match (self.mode, resolved) {
            (ConditionMode::Query, Some(resolved)) => Some(Expression::Field(FieldValue::new(
                resolved.field,
                resolved.path,
                resolved.join,
                resolved.model,
            ))),
            (ConditionMode::Query, None) => None,
            (ConditionMode::Pull, Some(resolved)) => {
                // Paths inside list elements, nested objects included, are keyed
                // relative to the element
                let in_element = [self.model, resolved.model].iter().any(|model| {
                    self.schema.model(*model).model_type() == ModelType::SubModelList
                });
                if matches!(resolved.field.kind(), FieldKind::BasicValuesList) {
                    Some(element(path, None))
                } else if in_element {
                    Some(element(path, Some(resolved.field)))
                } else {
                    Some(Expression::Field(FieldValue::new(
                        resolved.field,
                        resolved.path,
                        resolved.join,
                        resolved.model,
                    )))
                }
            }
            (ConditionMode::Pull, None) => None,
            (ConditionMode::ArrayFilter, resolved) => {
                Some(element(path, resolved.map(|resolved| resolved.field)))
            }
        };
        Ok(expression)
    }

    fn operator(&self, key: &str) -> DocqlResult<FunctionDef> {
        self.registry
            .get_operator(key)
            .copied()
            .ok_or_else(|| invalid_expression(format!("'{}' is not a recognized operator", key)))
    }

    fn function(&self, name: &str) -> DocqlResult<FunctionDef> {
        self.registry.get(name).copied().ok_or_else(|| {
            DocqlError::client(
                ErrorCode::UnsupportedFunction,
                format!("The '{}' function is not registered", name),
            )
        })
    }
}

fn element(name: &str, field: Option<docql_core::Field>) -> Expression {
    Expression::ArrayFilterField(ArrayFilterFieldValue::new(name, field))
}

/// Object whose keys are all operators
pub(crate) fn is_operator_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|key| key.starts_with('$'))
}

fn invalid_expression(message: impl Into<String>) -> DocqlError {
    DocqlError::client(ErrorCode::InvalidExpression, message)
}
