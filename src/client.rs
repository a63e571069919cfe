//! Client, database and model handles.
//!
//! A [`Client`] resolves database names through a [`MetadataProvider`] and an
//! [`AdapterProvider`], caching one [`Database`] per name. Model handles turn each
//! call into one [`DbAction`], apply the options in a fixed order (joins first, so
//! that conditions, projections and sorting can use joined fields) and execute it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use docql_core::{
    DatabaseMeta, DocqlError, DocqlResult, ErrorCode, FunctionRegistry, ModelId, Schema,
    TextEncryptor,
};

use crate::action::{ActionEnv, DbAction};
use crate::adapter::{DatabaseAdapter, Method};

/// Source of read-only schema metadata
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn database(&self, name: &str) -> DocqlResult<Option<DatabaseMeta>>;
}

/// Metadata held in memory, keyed by database name
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    databases: HashMap<String, DatabaseMeta>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, meta: DatabaseMeta) -> Self {
        self.databases.insert(meta.name.clone(), meta);
        self
    }

    /// One database definition in its JSON form
    pub fn from_json(text: &str) -> DocqlResult<Self> {
        let meta: DatabaseMeta = serde_json::from_str(text)?;
        Ok(Self::new().with_database(meta))
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    async fn database(&self, name: &str) -> DocqlResult<Option<DatabaseMeta>> {
        Ok(self.databases.get(name).cloned())
    }
}

/// Picks the adapter serving a database
pub trait AdapterProvider: Send + Sync {
    fn adapter(&self, database: &str) -> Option<Arc<dyn DatabaseAdapter>>;
}

/// One adapter for every database
#[derive(Clone)]
pub struct SharedAdapter(pub Arc<dyn DatabaseAdapter>);

impl AdapterProvider for SharedAdapter {
    fn adapter(&self, _database: &str) -> Option<Arc<dyn DatabaseAdapter>> {
        Some(self.0.clone())
    }
}

impl AdapterProvider for HashMap<String, Arc<dyn DatabaseAdapter>> {
    fn adapter(&self, database: &str) -> Option<Arc<dyn DatabaseAdapter>> {
        self.get(database).cloned()
    }
}

pub struct Client {
    metadata: Arc<dyn MetadataProvider>,
    adapters: Arc<dyn AdapterProvider>,
    registry: Arc<FunctionRegistry>,
    encryptor: Option<Arc<dyn TextEncryptor>>,
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl Client {
    pub fn new(metadata: Arc<dyn MetadataProvider>, adapters: Arc<dyn AdapterProvider>) -> Self {
        Self {
            metadata,
            adapters,
            registry: Arc::new(FunctionRegistry::standard()),
            encryptor: None,
            databases: RwLock::new(HashMap::new()),
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

    /// Database handle, built on first use and cached afterwards
    pub async fn database(&self, name: &str) -> DocqlResult<Arc<Database>> {
        if let Some(database) = self.databases.read().await.get(name) {
            return Ok(database.clone());
        }

        let meta = self.metadata.database(name).await?.ok_or_else(|| {
            DocqlError::client(
                ErrorCode::DatabaseNotFound,
                format!("Cannot find the database identified by name '{}'", name),
            )
        })?;
        let adapter = self.adapters.adapter(name).ok_or_else(|| {
            DocqlError::client(
                ErrorCode::AdapterNotFound,
                format!("Cannot find the adapter of the database '{}'", name),
            )
        })?;
        let schema = Schema::from_meta(&meta)?;

        let mut env = ActionEnv::new(Arc::new(schema), adapter).with_registry(self.registry.clone());
        if let Some(encryptor) = &self.encryptor {
            env = env.with_encryptor(encryptor.clone());
        }
        tracing::info!(
            "Loaded {} database '{}' with {} model(s)",
            env.dialect(),
            name,
            meta.models.len()
        );

        let mut databases = self.databases.write().await;
        let database = databases
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Database { env }));
        Ok(database.clone())
    }
}

pub struct Database {
    env: ActionEnv,
}

impl Database {
    pub fn name(&self) -> &str {
        self.env.schema.name()
    }

    pub fn schema(&self) -> &Schema {
        &self.env.schema
    }

    pub fn model(&self, name: &str) -> DocqlResult<ModelHandle> {
        let model = self.env.schema.model_by_name(name).ok_or_else(|| {
            DocqlError::client(
                ErrorCode::ModelNotFound,
                format!(
                    "Cannot find the model '{}' in the database '{}'",
                    name,
                    self.name()
                ),
            )
        })?;
        Ok(ModelHandle {
            env: self.env.clone(),
            model,
        })
    }

    /// Blank action for callers that configure every option themselves
    pub fn action(&self, model: &str) -> DocqlResult<DbAction> {
        Ok(self.model(model)?.action())
    }

    pub async fn begin_transaction(&self) -> DocqlResult<()> {
        tracing::info!("Beginning transaction on '{}'", self.name());
        self.env.adapter.begin_transaction(self.name()).await
    }

    pub async fn commit_transaction(&self) -> DocqlResult<()> {
        tracing::info!("Committing transaction on '{}'", self.name());
        self.env.adapter.commit_transaction(self.name()).await
    }

    pub async fn rollback_transaction(&self) -> DocqlResult<()> {
        tracing::info!("Rolling back transaction on '{}'", self.name());
        self.env.adapter.rollback_transaction(self.name()).await
    }
}

/// Options of `find_by_id` and `find_one`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    pub join: Option<Value>,
    pub select: Option<Value>,
    pub omit: Option<Value>,
    pub sort: Option<Value>,
    #[serde(default)]
    pub use_read_replica: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyOptions {
    pub join: Option<Value>,
    pub select: Option<Value>,
    pub omit: Option<Value>,
    pub sort: Option<Value>,
    pub skip: Option<Value>,
    pub limit: Option<Value>,
    #[serde(default)]
    pub use_read_replica: bool,
    #[serde(default)]
    pub return_count: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    pub join: Option<Value>,
    pub select: Option<Value>,
    pub omit: Option<Value>,
    pub array_filters: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    pub join: Option<Value>,
}

/// Entry point for the operations of one model
#[derive(Clone)]
pub struct ModelHandle {
    env: ActionEnv,
    model: ModelId,
}

impl ModelHandle {
    pub fn name(&self) -> &str {
        self.env.schema.model(self.model).name()
    }

    pub fn action(&self) -> DbAction {
        DbAction::new(self.env.clone(), self.model)
    }

    pub async fn create_one(&self, data: &Value) -> DocqlResult<Value> {
        if !data.is_object() {
            return Err(DocqlError::client(
                ErrorCode::InvalidValue,
                "The data to create needs to be a JSON object",
            ));
        }
        let mut action = self.action();
        action.set_method(Method::CreateOne);
        action.set_create_data(data).await?;
        action.execute().await
    }

    pub async fn create_many(&self, data: &Value) -> DocqlResult<Value> {
        if !data.is_array() {
            return Err(DocqlError::client(
                ErrorCode::InvalidValue,
                "The data to create needs to be an array of JSON objects",
            ));
        }
        let mut action = self.action();
        action.set_method(Method::CreateMany);
        action.set_create_data(data).await?;
        action.execute().await
    }

    pub async fn find_by_id(&self, id: &Value, options: FindOptions) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::FindById);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_id(id)?;
        apply_projection(&mut action, options.select.as_ref(), options.omit.as_ref())?;
        action.set_read_replica(options.use_read_replica);
        action.execute().await
    }

    pub async fn find_one(&self, condition: &Value, options: FindOptions) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::FindOne);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_where(condition)?;
        apply_projection(&mut action, options.select.as_ref(), options.omit.as_ref())?;
        if let Some(sort) = &options.sort {
            action.set_sort(sort)?;
        }
        action.set_read_replica(options.use_read_replica);
        action.execute().await
    }

    pub async fn find_many(&self, condition: &Value, options: FindManyOptions) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::FindMany);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_where(condition)?;
        apply_projection(&mut action, options.select.as_ref(), options.omit.as_ref())?;
        if let Some(sort) = &options.sort {
            action.set_sort(sort)?;
        }
        if let Some(skip) = &options.skip {
            action.set_skip(skip)?;
        }
        if let Some(limit) = &options.limit {
            action.set_limit(limit)?;
        }
        action.set_read_replica(options.use_read_replica);
        action.set_return_count(options.return_count);
        action.execute().await
    }

    pub async fn delete_by_id(&self, id: &Value) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::DeleteById);
        action.set_id(id)?;
        action.execute().await
    }

    pub async fn delete_one(&self, condition: &Value, options: DeleteOptions) -> DocqlResult<Value> {
        self.delete(Method::DeleteOne, condition, options).await
    }

    pub async fn delete_many(&self, condition: &Value, options: DeleteOptions) -> DocqlResult<Value> {
        self.delete(Method::DeleteMany, condition, options).await
    }

    pub async fn update_by_id(
        &self,
        id: &Value,
        updates: &Value,
        options: UpdateOptions,
    ) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::UpdateById);
        action.set_id(id)?;
        self.apply_update(action, updates, options).await
    }

    pub async fn update_one(
        &self,
        condition: &Value,
        updates: &Value,
        options: UpdateOptions,
    ) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::UpdateOne);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_where(condition)?;
        self.apply_update(action, updates, options).await
    }

    pub async fn update_many(
        &self,
        condition: &Value,
        updates: &Value,
        options: UpdateOptions,
    ) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(Method::UpdateMany);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_where(condition)?;
        self.apply_update(action, updates, options).await
    }

    async fn delete(
        &self,
        method: Method,
        condition: &Value,
        options: DeleteOptions,
    ) -> DocqlResult<Value> {
        let mut action = self.action();
        action.set_method(method);
        apply_join(&mut action, options.join.as_ref())?;
        action.set_where(condition)?;
        action.execute().await
    }

    async fn apply_update(
        &self,
        mut action: DbAction,
        updates: &Value,
        options: UpdateOptions,
    ) -> DocqlResult<Value> {
        action.set_updates(updates).await?;
        if let Some(filters) = &options.array_filters {
            action.set_array_filters(filters)?;
        }
        apply_projection(&mut action, options.select.as_ref(), options.omit.as_ref())?;
        action.execute().await
    }
}

fn apply_join(action: &mut DbAction, join: Option<&Value>) -> DocqlResult<()> {
    match join {
        Some(join) => action.set_join(join),
        None => Ok(()),
    }
}

fn apply_projection(
    action: &mut DbAction,
    select: Option<&Value>,
    omit: Option<&Value>,
) -> DocqlResult<()> {
    if let Some(select) = select {
        action.set_select(select)?;
    }
    if let Some(omit) = omit {
        action.set_omit(omit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::ExplainAdapter;
    use crate::test_support::{ObjectId, SHOP_SCHEMA};
    use serde_json::json;

    fn client() -> (Client, Arc<ExplainAdapter>) {
        let adapter = Arc::new(ExplainAdapter::new());
        let metadata = StaticMetadata::from_json(SHOP_SCHEMA).unwrap();
        let client = Client::new(Arc::new(metadata), Arc::new(SharedAdapter(adapter.clone())));
        (client, adapter)
    }

    #[tokio::test]
    async fn test_database_handles_are_cached() {
        let (client, _) = client();
        let first = client.database("shop").await.unwrap();
        let second = client.database("shop").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "shop");
    }

    #[tokio::test]
    async fn test_unknown_names_are_reported() {
        let (client, _) = client();
        let err = client.database("nowhere").await.err().unwrap();
        assert_eq!(err.code(), Some(ErrorCode::DatabaseNotFound));

        let database = client.database("shop").await.unwrap();
        let err = database.model("profile").err().unwrap();
        assert_eq!(err.code(), Some(ErrorCode::ModelNotFound));

        let metadata = StaticMetadata::from_json(SHOP_SCHEMA).unwrap();
        let adapters: HashMap<String, Arc<dyn DatabaseAdapter>> = HashMap::new();
        let client = Client::new(Arc::new(metadata), Arc::new(adapters));
        let err = client.database("shop").await.err().unwrap();
        assert_eq!(err.code(), Some(ErrorCode::AdapterNotFound));
    }

    #[tokio::test]
    async fn test_find_many_options_reach_the_command() {
        let (client, _) = client();
        let users = client.database("shop").await.unwrap().model("users").unwrap();
        let options: FindManyOptions = serde_json::from_value(json!({
            "select": ["name"],
            "sort": {"name": "asc"},
            "limit": 5,
            "returnCount": true
        }))
        .unwrap();
        let command = users
            .find_many(&json!({"age": {"$gte": 21}}), options)
            .await
            .unwrap();
        assert_eq!(command["find"], json!("users"));
        assert_eq!(command["sort"], json!({"name": 1}));
        assert_eq!(command["limit"], json!(5));
        assert_eq!(command["returnCount"], json!(true));
    }

    #[tokio::test]
    async fn test_update_by_id_refreshes_updated_at() {
        let (client, adapter) = client();
        let users = client.database("shop").await.unwrap().model("users").unwrap();
        users
            .update_by_id(&json!(ObjectId::FIRST), &json!({"name": "Ada"}), UpdateOptions::default())
            .await
            .unwrap();

        let commands = adapter.commands().await;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["update"]["$set"]["name"], json!("Ada"));
        assert!(commands[0]["update"]["$set"]["updatedAt"].get("$date").is_some());
    }

    #[tokio::test]
    async fn test_transactions_are_forwarded() {
        let (client, adapter) = client();
        let database = client.database("shop").await.unwrap();
        database.begin_transaction().await.unwrap();
        database.rollback_transaction().await.unwrap();
        let steps: Vec<Value> = adapter
            .commands()
            .await
            .into_iter()
            .map(|command| command["transaction"].clone())
            .collect();
        assert_eq!(steps, vec![json!("begin"), json!("rollback")]);
    }
}
