//! Update instruction compilation.

use serde_json::{json, Map, Value};

use docql_core::{
    Dialect, DocqlError, DocqlResult, ErrorCode, Field, FieldKind, PrepareContext, PullTarget,
    Schema,
};

use super::condition::{is_operator_map, ConditionMode};
use super::paths::{is_positional_segment, resolve_field, strip_positional};
use super::{invalid_value, CreateData, DbAction, UpdateData, UpdateEntry, UpdateOp, UpdateValue};

/// Field an update key addresses
struct UpdateTarget {
    field: Field,
    /// Emitted key, positional segments kept
    name: String,
    /// Schema path without positional segments
    path: String,
    /// Owned by a sub-model rather than the action's model
    nested: bool,
    /// Last segment is positional, so the value is one list entry
    element: bool,
}

impl DbAction {
    /// Compile `{field: value | {$op: payload}}` update instructions.
    ///
    /// Field issues from assignments accumulate and are raised together; structural
    /// problems with an instruction fail immediately.
    pub async fn set_updates(&mut self, input: &Value) -> DocqlResult<()> {
        let instructions = match input {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(invalid_value(
                    "The update instructions need to be a non-empty JSON object",
                ))
            }
        };

        let schema = self.env.schema.clone();
        let mut ctx = self.prepare_context();
        let mut updates = UpdateData::default();

        for (key, value) in instructions {
            let target = self.update_target(&schema, key)?;
            if target.element {
                self.assign_element(&target, value, &mut updates).await?;
                continue;
            }
            match value {
                Value::Null => {
                    if target.field.is_required() {
                        return Err(required_null(&target));
                    }
                    assign(&schema, &target, value, &mut updates, &mut ctx).await;
                }
                Value::Object(map)
                    if matches!(target.field.kind(), FieldKind::Json) && !is_operator_map(map) =>
                {
                    assign(&schema, &target, value, &mut updates, &mut ctx).await;
                }
                Value::Object(map) => {
                    self.process_instruction(&schema, &target, map, &mut updates, &mut ctx)
                        .await?;
                }
                _ => assign(&schema, &target, value, &mut updates, &mut ctx).await,
            }
        }

        for field in schema
            .model(self.model)
            .fields()
            .filter(|field| matches!(field.kind(), FieldKind::UpdatedAt))
        {
            if updates.set.contains_key(field.query_path()) {
                continue;
            }
            let mut refreshed = Map::new();
            field
                .prepare(&schema, None, &mut refreshed, &mut ctx, false, None)
                .await;
            if let Some(value) = refreshed.remove(field.name()) {
                updates.set.insert(field.query_path().to_string(), value);
            }
        }

        if ctx.has_issues() {
            return Err(DocqlError::validation(ctx.take_issues()));
        }
        tracing::debug!(
            "Compiled {} assignment(s) and {} other update instruction(s) for '{}'",
            updates.set.len(),
            updates.others.len(),
            self.model().name()
        );
        self.definition.updates = Some(updates);
        Ok(())
    }

    fn update_target(&self, schema: &Schema, key: &str) -> DocqlResult<UpdateTarget> {
        let (path, positional) = strip_positional(key);
        let resolved = resolve_field(schema, self.model, &path, &[]).ok_or_else(|| {
            DocqlError::client(
                ErrorCode::InvalidField,
                format!(
                    "Cannot identify the field '{}' to update in the '{}' model",
                    key,
                    self.model().name()
                ),
            )
        })?;
        if resolved.field.is_system_field() {
            return Err(DocqlError::client(
                ErrorCode::InvalidField,
                format!("'{}' is a system managed field and cannot be updated", key),
            ));
        }
        if resolved.field.is_read_only() {
            return Err(DocqlError::client(
                ErrorCode::InvalidField,
                format!("'{}' is a read-only field and cannot be updated", key),
            ));
        }

        let element = key.rsplit('.').next().is_some_and(is_positional_segment);
        if element && !resolved.field.is_array() {
            return Err(invalid_instruction(format!(
                "'{}' uses a positional operator but '{}' is a '{}' field",
                key,
                path,
                resolved.field.type_tag()
            )));
        }

        Ok(UpdateTarget {
            nested: resolved.model != self.model,
            name: if positional { key.to_string() } else { resolved.path },
            path,
            field: resolved.field,
            element,
        })
    }

    /// Assign one entry of a list addressed by a positional key
    async fn assign_element(
        &self,
        target: &UpdateTarget,
        value: &Value,
        updates: &mut UpdateData,
    ) -> DocqlResult<()> {
        let prepared = match (target.field.kind(), value) {
            (FieldKind::BasicValuesList, Value::Object(_) | Value::Array(_)) => {
                return Err(invalid_value(format!(
                    "Only basic values can be assigned to an entry of the '{}' field",
                    target.path
                )))
            }
            (FieldKind::BasicValuesList, scalar) => scalar.clone(),
            (FieldKind::ObjectList { sub_model }, Value::Object(map)) if !is_operator_map(map) => {
                let mut nested =
                    DbAction::new(self.env.clone(), *sub_model).with_timestamp(self.timestamp);
                nested.set_create_data(value).await?;
                match nested.definition.create_data {
                    Some(CreateData::One(document)) => Value::Object(document),
                    _ => Value::Object(Map::new()),
                }
            }
            _ => {
                return Err(invalid_value(format!(
                    "An entry of the object-list field '{}' needs to be a JSON object",
                    target.path
                )))
            }
        };
        file_assignment(target, prepared, updates);
        Ok(())
    }

    async fn process_instruction(
        &self,
        schema: &Schema,
        target: &UpdateTarget,
        instruction: &Map<String, Value>,
        updates: &mut UpdateData,
        ctx: &mut PrepareContext,
    ) -> DocqlResult<()> {
        let mut entries = instruction.iter();
        let (key, payload) = match (entries.next(), instruction.len()) {
            (Some(entry), 1) => entry,
            _ => {
                return Err(invalid_instruction(format!(
                    "The update instruction of '{}' needs exactly one update operator",
                    target.name
                )))
            }
        };
        let op = UpdateOp::from_key(key).ok_or_else(|| {
            invalid_instruction(format!(
                "'{}' is not a valid update operator for '{}'",
                key, target.name
            ))
        })?;
        let field = &target.field;

        let value = match op {
            UpdateOp::Set => {
                if payload.is_object() && !matches!(field.kind(), FieldKind::Json) {
                    return Err(invalid_instruction(format!(
                        "The $set instruction of '{}' cannot assign an object value",
                        target.name
                    )));
                }
                if payload.is_null() && field.is_required() {
                    return Err(required_null(target));
                }
                assign(schema, target, payload, updates, ctx).await;
                return Ok(());
            }
            UpdateOp::Unset => {
                if field.is_required() {
                    return Err(invalid_instruction(format!(
                        "'{}' is a required field and cannot be unset",
                        target.name
                    )));
                }
                if ctx.dialect() != Dialect::MongoDb {
                    return Err(invalid_instruction(format!(
                        "The $unset instruction is not supported in {} databases",
                        ctx.dialect()
                    )));
                }
                UpdateValue::Literal(Value::String(String::new()))
            }
            UpdateOp::Inc | UpdateOp::Mul | UpdateOp::Min | UpdateOp::Max => {
                if !field.is_numeric() {
                    return Err(invalid_instruction(format!(
                        "The {} instruction can only be used with numeric fields but '{}' is a '{}' field",
                        key,
                        target.name,
                        field.type_tag()
                    )));
                }
                let Some(number) = payload.as_f64() else {
                    return Err(invalid_value(format!(
                        "The {} instruction of '{}' needs a numeric value",
                        key, target.name
                    )));
                };
                if matches!(field.kind(), FieldKind::Integer) && number.fract() != 0.0 {
                    return Err(invalid_value(format!(
                        "The {} instruction of the integer field '{}' needs an integer value",
                        key, target.name
                    )));
                }
                UpdateValue::Literal(payload.clone())
            }
            UpdateOp::Push => UpdateValue::Literal(self.push_value(target, key, payload).await?),
            UpdateOp::Pull => self.pull_value(target, payload)?,
            UpdateOp::Pop => {
                if !field.is_array() {
                    return Err(not_array(key, target));
                }
                let direction = if key == "$shift" { -1 } else { 1 };
                UpdateValue::Literal(json!(direction))
            }
        };

        updates.others.push(UpdateEntry {
            op,
            field_name: target.name.clone(),
            value,
        });
        Ok(())
    }

    async fn push_value(&self, target: &UpdateTarget, key: &str, payload: &Value) -> DocqlResult<Value> {
        match target.field.kind() {
            FieldKind::ObjectList { sub_model } => {
                let mut nested =
                    DbAction::new(self.env.clone(), *sub_model).with_timestamp(self.timestamp);
                nested.set_create_data(payload).await?;
                let documents = match nested.definition.create_data {
                    Some(CreateData::One(document)) => vec![Value::Object(document)],
                    Some(CreateData::Many(documents)) => {
                        documents.into_iter().map(Value::Object).collect()
                    }
                    None => Vec::new(),
                };
                Ok(json!({ "$each": documents }))
            }
            FieldKind::BasicValuesList => match payload {
                Value::Array(entries) => {
                    if entries.iter().any(|entry| entry.is_object() || entry.is_array()) {
                        return Err(invalid_value(format!(
                            "Only basic values can be pushed to the '{}' field",
                            target.name
                        )));
                    }
                    Ok(json!({ "$each": entries }))
                }
                Value::Object(_) | Value::Null => Err(invalid_value(format!(
                    "Only basic values can be pushed to the '{}' field",
                    target.name
                ))),
                scalar => Ok(scalar.clone()),
            },
            _ => Err(not_array(key, target)),
        }
    }

    fn pull_value(&self, target: &UpdateTarget, payload: &Value) -> DocqlResult<UpdateValue> {
        let empty = match payload {
            Value::Null => true,
            Value::String(text) => text.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(entries) => entries.is_empty(),
            _ => false,
        };
        if empty {
            return Err(invalid_value(format!(
                "The $pull instruction of '{}' needs a condition",
                target.name
            )));
        }

        match target.field.kind() {
            FieldKind::ObjectList { sub_model } => {
                if !payload.is_object() {
                    return Err(invalid_value(format!(
                        "The $pull condition of the object-list field '{}' needs to be a JSON object",
                        target.name
                    )));
                }
                let nested = DbAction::new(self.env.clone(), *sub_model);
                let condition = nested.compile_condition(payload, ConditionMode::Pull)?;
                Ok(UpdateValue::Condition(condition, PullTarget::Document))
            }
            FieldKind::BasicValuesList => match payload {
                Value::Array(_) => Err(invalid_value(format!(
                    "The $pull condition of '{}' cannot be an array",
                    target.name
                ))),
                Value::Object(map) => {
                    let wrapped;
                    let condition = if is_operator_map(map)
                        && !map.contains_key("$and")
                        && !map.contains_key("$or")
                    {
                        let mut keyed = Map::new();
                        keyed.insert(target.path.clone(), payload.clone());
                        wrapped = Value::Object(keyed);
                        &wrapped
                    } else {
                        payload
                    };
                    let compiled = self.compile_condition(condition, ConditionMode::Pull)?;
                    Ok(UpdateValue::Condition(compiled, PullTarget::Value))
                }
                scalar => Ok(UpdateValue::Literal(scalar.clone())),
            },
            _ => Err(not_array("$pull", target)),
        }
    }
}

/// Run the field's update preparation and file the result as an assignment
async fn assign(
    schema: &Schema,
    target: &UpdateTarget,
    value: &Value,
    updates: &mut UpdateData,
    ctx: &mut PrepareContext,
) {
    let mut prepared = Map::new();
    target
        .field
        .prepare(schema, Some(value), &mut prepared, ctx, false, None)
        .await;
    let Some(value) = prepared.remove(target.field.name()) else {
        return;
    };
    file_assignment(target, value, updates);
}

fn file_assignment(target: &UpdateTarget, value: Value, updates: &mut UpdateData) {
    if target.nested {
        updates.others.push(UpdateEntry {
            op: UpdateOp::Set,
            field_name: target.name.clone(),
            value: UpdateValue::Literal(value),
        });
    } else {
        updates.set.insert(target.name.clone(), value);
    }
}

fn required_null(target: &UpdateTarget) -> DocqlError {
    DocqlError::client(
        ErrorCode::InvalidRequiredFieldValue,
        format!("'{}' is a required field and cannot be set to null", target.name),
    )
}

fn not_array(key: &str, target: &UpdateTarget) -> DocqlError {
    invalid_instruction(format!(
        "The {} instruction can only be used with array fields but '{}' is a '{}' field",
        key,
        target.name,
        target.field.type_tag()
    ))
}

fn invalid_instruction(message: impl Into<String>) -> DocqlError {
    DocqlError::client(ErrorCode::InvalidUpdateInstruction, message)
}
