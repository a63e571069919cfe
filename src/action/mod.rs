//! Single-use builder for one document operation.
//!
//! A [`DbAction`] is created for a model, configured through its `set_*` calls (later
//! calls overwrite earlier ones for the same slot) and consumed by [`DbAction::execute`],
//! which hands the compiled [`ActionDefinition`] to exactly one adapter method.

mod condition;
mod create;
pub mod definition;
mod join;
pub mod paths;
mod update;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use docql_core::schema::formats;
use docql_core::{
    Dialect, DocqlError, DocqlResult, ErrorCode, Expression, FunctionRegistry, Model, ModelId,
    PrepareContext, Schema, TextEncryptor,
};

pub use condition::{ConditionCompiler, ConditionMode};
pub use definition::{
    ActionDefinition, CreateData, JoinDef, SortEntry, SortOrder, UpdateData, UpdateEntry,
    UpdateOp, UpdateValue,
};
pub use paths::{resolve_field, ResolvedField};

use crate::adapter::{self, DatabaseAdapter, Method, Operation};

/// Everything an action needs from the database it runs against
#[derive(Clone)]
pub struct ActionEnv {
    pub schema: Arc<Schema>,
    pub registry: Arc<FunctionRegistry>,
    pub adapter: Arc<dyn DatabaseAdapter>,
    pub encryptor: Option<Arc<dyn TextEncryptor>>,
}

impl ActionEnv {
    pub fn new(schema: Arc<Schema>, adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self {
            schema,
            registry: Arc::new(FunctionRegistry::standard()),
            adapter,
            encryptor: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_encryptor(mut self, encryptor: Arc<dyn TextEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.schema.dialect()
    }
}

pub struct DbAction {
    env: ActionEnv,
    model: ModelId,
    timestamp: DateTime<Utc>,
    definition: ActionDefinition,
}

impl DbAction {
    pub fn new(env: ActionEnv, model: ModelId) -> Self {
        Self {
            env,
            model,
            timestamp: Utc::now(),
            definition: ActionDefinition::default(),
        }
    }

    /// Fix the timestamp used for created-at, updated-at and `$$NOW` values
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn model(&self) -> &Model {
        self.env.schema.model(self.model)
    }

    pub fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> ActionDefinition {
        self.definition
    }

    pub fn set_method(&mut self, method: Method) {
        self.definition.method = Some(method);
    }

    /// Joins have to be set before any option that may reference joined fields
    pub fn set_join(&mut self, spec: &Value) -> DocqlResult<()> {
        self.definition.joins =
            join::build_joins(&self.env.schema, &self.env.registry, self.model, spec)?;
        Ok(())
    }

    pub fn set_where(&mut self, condition: &Value) -> DocqlResult<()> {
        let compiled = self.compile_condition(condition, ConditionMode::Query)?;
        self.definition.filter = Some(compiled);
        Ok(())
    }

    pub fn set_select(&mut self, spec: &Value) -> DocqlResult<()> {
        if self.definition.omit.is_some() {
            return Err(select_and_omit());
        }
        self.definition.select = Some(self.field_list(spec, "select")?);
        Ok(())
    }

    pub fn set_omit(&mut self, spec: &Value) -> DocqlResult<()> {
        if self.definition.select.is_some() {
            return Err(select_and_omit());
        }
        self.definition.omit = Some(self.field_list(spec, "omit")?);
        Ok(())
    }

    /// `{path: "asc" | "desc"}`, joined paths allowed
    pub fn set_sort(&mut self, spec: &Value) -> DocqlResult<()> {
        let Value::Object(entries) = spec else {
            return Err(invalid_value(
                "Sort definition needs to be a JSON object of field names and 'asc' or 'desc' orders",
            ));
        };

        let mut sort = Vec::with_capacity(entries.len());
        for (path, order) in entries {
            let resolved = self.resolve(path).ok_or_else(|| {
                DocqlError::client(
                    ErrorCode::InvalidField,
                    format!("Cannot identify the sort field '{}'", path),
                )
            })?;
            let order = match order.as_str().map(str::to_ascii_lowercase).as_deref() {
                Some("asc") => SortOrder::Asc,
                Some("desc") => SortOrder::Desc,
                _ => {
                    return Err(invalid_value(format!(
                        "The sort order of '{}' needs to be 'asc' or 'desc'",
                        path
                    )))
                }
            };
            sort.push(SortEntry {
                field_name: resolved.path,
                order,
            });
        }
        self.definition.sort = sort;
        Ok(())
    }

    pub fn set_id(&mut self, id: &Value) -> DocqlResult<()> {
        let id = match id {
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => String::new(),
        };
        if id.is_empty() {
            return Err(invalid_value("The record identifier needs to be provided"));
        }
        if self.env.dialect() == Dialect::MongoDb && !formats::is_object_id(&id) {
            return Err(invalid_value(format!(
                "'{}' is not a valid MongoDB object identifier",
                id
            )));
        }
        self.definition.id = Some(id);
        Ok(())
    }

    pub fn set_skip(&mut self, skip: &Value) -> DocqlResult<()> {
        self.definition.skip = Some(count_option(skip, "skip")?);
        Ok(())
    }

    pub fn set_limit(&mut self, limit: &Value) -> DocqlResult<()> {
        self.definition.limit = Some(count_option(limit, "limit")?);
        Ok(())
    }

    pub fn set_read_replica(&mut self, use_read_replica: bool) {
        self.definition.use_read_replica = use_read_replica;
    }

    pub fn set_return_count(&mut self, return_count: bool) {
        self.definition.return_count = return_count;
    }

    /// Compile each condition in the array-filter grammar
    pub fn set_array_filters(&mut self, filters: &Value) -> DocqlResult<()> {
        let Value::Array(entries) = filters else {
            return Err(invalid_value(
                "Array filters need to be an array of condition objects",
            ));
        };
        let compiled = entries
            .iter()
            .map(|entry| self.compile_condition(entry, ConditionMode::ArrayFilter))
            .collect::<DocqlResult<Vec<_>>>()?;
        self.definition.array_filters = compiled;
        Ok(())
    }

    pub fn compile_condition(&self, condition: &Value, mode: ConditionMode) -> DocqlResult<Expression> {
        ConditionCompiler::new(
            &self.env.schema,
            &self.env.registry,
            self.model,
            &self.definition.joins,
            mode,
        )
        .compile(condition)
    }

    /// Build the operation this action would dispatch
    pub fn operation(&self) -> DocqlResult<Operation> {
        let method = self.definition.method.ok_or_else(|| {
            DocqlError::client(
                ErrorCode::MissingMethod,
                "The action has no method to execute",
            )
        })?;
        Ok(Operation {
            database: self.env.schema.name().to_string(),
            model: self.model().qualified_name(),
            dialect: self.env.dialect(),
            method,
            definition: self.definition.clone(),
        })
    }

    /// Dispatch to the adapter and return its result unchanged.
    ///
    /// Consumes the action; a configured action runs at most once.
    pub async fn execute(self) -> DocqlResult<Value> {
        let operation = self.operation()?;
        adapter::dispatch(self.env.adapter.as_ref(), &operation).await
    }

    fn prepare_context(&self) -> PrepareContext {
        PrepareContext::with_timestamp(self.env.dialect(), self.env.encryptor.clone(), self.timestamp)
    }

    fn resolve(&self, path: &str) -> Option<ResolvedField> {
        resolve_field(&self.env.schema, self.model, path, &self.definition.joins)
    }

    /// Field names from a space separated string or an array of names.
    /// Every unknown name is reported in one error.
    fn field_list(&self, spec: &Value, option: &str) -> DocqlResult<Vec<String>> {
        let names: Vec<&str> = match spec {
            Value::String(text) => text.split_whitespace().collect(),
            Value::Array(entries) if entries.iter().all(Value::is_string) => {
                entries.iter().filter_map(Value::as_str).collect()
            }
            _ => {
                return Err(invalid_value(format!(
                    "The {} option needs to list field names, either a space separated string e.g., 'name email profile.city' or an array of names",
                    option
                )))
            }
        };
        if names.is_empty() {
            return Err(invalid_value(format!(
                "The {} option needs at least one field name",
                option
            )));
        }

        let mut paths = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            match self.resolve(name) {
                Some(resolved) => paths.push(resolved.path),
                None => unknown.push(name),
            }
        }
        if !unknown.is_empty() {
            return Err(DocqlError::client(
                ErrorCode::InvalidField,
                format!(
                    "Cannot identify the following {} field(s) in the '{}' model: {}",
                    option,
                    self.model().name(),
                    unknown.join(", ")
                ),
            ));
        }
        Ok(paths)
    }
}

fn count_option(value: &Value, option: &str) -> DocqlResult<u64> {
    value.as_u64().ok_or_else(|| {
        invalid_value(format!(
            "The {} option needs to be a non-negative integer but received '{}'",
            option, value
        ))
    })
}

fn select_and_omit() -> DocqlError {
    invalid_value("Select and omit options cannot be used together")
}

pub(crate) fn invalid_value(message: impl Into<String>) -> DocqlError {
    DocqlError::client(ErrorCode::InvalidValue, message)
}
