//! Contract between compiled actions and the storage layer.
//!
//! The compiler never talks to a database. Every executed action becomes one
//! [`Operation`] handed to exactly one [`DatabaseAdapter`] method; whatever the adapter
//! returns is passed back to the caller untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use docql_core::{Dialect, DocqlResult};

use crate::action::ActionDefinition;

/// Logical operation a [`crate::DbAction`] performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    CreateOne,
    CreateMany,
    FindById,
    FindOne,
    FindMany,
    DeleteById,
    DeleteOne,
    DeleteMany,
    UpdateById,
    UpdateOne,
    UpdateMany,
}

impl Method {
    pub const ALL: [Method; 11] = [
        Method::CreateOne,
        Method::CreateMany,
        Method::FindById,
        Method::FindOne,
        Method::FindMany,
        Method::DeleteById,
        Method::DeleteOne,
        Method::DeleteMany,
        Method::UpdateById,
        Method::UpdateOne,
        Method::UpdateMany,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::CreateOne => "createOne",
            Method::CreateMany => "createMany",
            Method::FindById => "findById",
            Method::FindOne => "findOne",
            Method::FindMany => "findMany",
            Method::DeleteById => "deleteById",
            Method::DeleteOne => "deleteOne",
            Method::DeleteMany => "deleteMany",
            Method::UpdateById => "updateById",
            Method::UpdateOne => "updateOne",
            Method::UpdateMany => "updateMany",
        }
    }

    /// Whether the operation targets a single record
    pub fn is_single(self) -> bool {
        !matches!(
            self,
            Method::CreateMany | Method::FindMany | Method::DeleteMany | Method::UpdateMany
        )
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled action ready for dispatch
#[derive(Debug, Clone)]
pub struct Operation {
    pub database: String,
    /// Collection name, prefixed with the relational schema when the model has one
    pub model: String,
    pub dialect: Dialect,
    pub method: Method,
    pub definition: ActionDefinition,
}

/// Storage backend executing compiled operations.
///
/// `delete` serves both `deleteOne` and `deleteMany`, `update` serves both
/// `updateOne` and `updateMany`; the method tag on the operation tells them apart.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    async fn create_one(&self, op: &Operation) -> DocqlResult<Value>;
    async fn create_many(&self, op: &Operation) -> DocqlResult<Value>;
    async fn find_by_id(&self, op: &Operation) -> DocqlResult<Value>;
    async fn find_one(&self, op: &Operation) -> DocqlResult<Value>;
    async fn find_many(&self, op: &Operation) -> DocqlResult<Value>;
    async fn delete_by_id(&self, op: &Operation) -> DocqlResult<Value>;
    async fn delete(&self, op: &Operation) -> DocqlResult<Value>;
    async fn update_by_id(&self, op: &Operation) -> DocqlResult<Value>;
    async fn update(&self, op: &Operation) -> DocqlResult<Value>;

    async fn begin_transaction(&self, database: &str) -> DocqlResult<()>;
    async fn commit_transaction(&self, database: &str) -> DocqlResult<()>;
    async fn rollback_transaction(&self, database: &str) -> DocqlResult<()>;
}

/// Route an operation to the adapter method serving its method tag
pub async fn dispatch(adapter: &dyn DatabaseAdapter, op: &Operation) -> DocqlResult<Value> {
    tracing::debug!("Dispatching {} on {}.{}", op.method, op.database, op.model);
    match op.method {
        Method::CreateOne => adapter.create_one(op).await,
        Method::CreateMany => adapter.create_many(op).await,
        Method::FindById => adapter.find_by_id(op).await,
        Method::FindOne => adapter.find_one(op).await,
        Method::FindMany => adapter.find_many(op).await,
        Method::DeleteById => adapter.delete_by_id(op).await,
        Method::DeleteOne | Method::DeleteMany => adapter.delete(op).await,
        Method::UpdateById => adapter.update_by_id(op).await,
        Method::UpdateOne | Method::UpdateMany => adapter.update(op).await,
    }
}
