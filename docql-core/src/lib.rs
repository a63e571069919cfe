//! DocQL Core - storage-independent condition compiler and schema coercion.
//!
//! This crate holds everything that does not need an adapter: the typed expression
//! tree and its MongoDB code generation, the function catalog, the schema arena and
//! per-field value coercion. The `docql` crate builds document actions on top of it.
//!
//! # Main Components
//!
//! - **Types**: expression kinds, return types and database dialects
//! - **Catalog**: declarative operator definitions in an explicit [`FunctionRegistry`]
//! - **Expression**: tree nodes, validation, `get_query` and `get_pull_query`
//! - **Schema**: models, fields and the create/update preparation pass
//!
//! # Example
//!
//! ```rust
//! use docql_core::{Dialect, Expression, FunctionRegistry, Function};
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::standard();
//! let add = *registry.get("add").unwrap();
//! let expr: Expression = Function::with_params(
//!     add,
//!     vec![Expression::literal(json!(1)), Expression::literal(json!(2))],
//! )
//! .into();
//!
//! expr.validate(Dialect::MongoDb).unwrap();
//! assert_eq!(expr.get_query(Dialect::MongoDb, None), Some(json!({"$add": [1, 2]})));
//! ```

pub mod catalog;
pub mod error;
pub mod expression;
pub mod schema;
pub mod types;

pub use catalog::{Arity, CustomOp, FunctionDef, FunctionRegistry, Mapping, ParamSpec};
pub use error::{
    DocqlError, DocqlResult, ErrorCode, ErrorOrigin, IssueDetails, ValidationCode,
    ValidationIssue,
};
pub use expression::{
    ArrayFilterFieldValue, ArrayValue, Expression, FieldValue, Function, JoinType, PathResolver,
    PullTarget, StaticValue,
};
pub use schema::{
    DatabaseMeta, Field, FieldKind, Model, ModelId, ModelType, PrepareContext, Schema,
    TextEncryptor,
};
pub use types::{Dialect, ExpressionType, ReturnType};
