pub mod action;
pub mod adapter;
pub mod client;
pub mod config;
pub mod explain;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use action::{ActionDefinition, ActionEnv, ConditionMode, CreateData, DbAction, JoinDef};
pub use adapter::{dispatch, DatabaseAdapter, Method, Operation};
pub use client::{
    AdapterProvider, Client, Database, DeleteOptions, FindManyOptions, FindOptions,
    MetadataProvider, ModelHandle, SharedAdapter, StaticMetadata, UpdateOptions,
};
pub use config::Config;
pub use explain::ExplainAdapter;

pub use docql_core::{
    DatabaseMeta, Dialect, DocqlError, DocqlResult, ErrorCode, Expression, FunctionRegistry,
    Schema, TextEncryptor, ValidationCode, ValidationIssue,
};
