//! Adapter that renders commands instead of running them.
//!
//! Every operation is turned into its MongoDB command document, recorded, and
//! returned as the result. Used by the CLI and by tests that assert on the exact
//! shape of what would reach the database.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use docql_core::DocqlResult;

use crate::adapter::{DatabaseAdapter, Operation};
use crate::pipeline;

#[derive(Debug, Default)]
pub struct ExplainAdapter {
    commands: Mutex<Vec<Value>>,
}

impl ExplainAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub async fn commands(&self) -> Vec<Value> {
        self.commands.lock().await.clone()
    }

    async fn render(&self, op: &Operation) -> DocqlResult<Value> {
        let command = pipeline::explain(op)?;
        tracing::debug!("{} on {}.{}: {}", op.method, op.database, op.model, command);
        self.commands.lock().await.push(command.clone());
        Ok(command)
    }

    async fn record_transaction(&self, step: &str, database: &str) {
        tracing::info!("Transaction {} on database '{}'", step, database);
        self.commands
            .lock()
            .await
            .push(json!({ "transaction": step, "database": database }));
    }
}

#[async_trait]
impl DatabaseAdapter for ExplainAdapter {
    async fn create_one(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn create_many(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn find_by_id(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn find_one(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn find_many(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn delete_by_id(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn delete(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn update_by_id(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn update(&self, op: &Operation) -> DocqlResult<Value> {
        self.render(op).await
    }

    async fn begin_transaction(&self, database: &str) -> DocqlResult<()> {
        self.record_transaction("begin", database).await;
        Ok(())
    }

    async fn commit_transaction(&self, database: &str) -> DocqlResult<()> {
        self.record_transaction("commit", database).await;
        Ok(())
    }

    async fn rollback_transaction(&self, database: &str) -> DocqlResult<()> {
        self.record_transaction("rollback", database).await;
        Ok(())
    }
}
