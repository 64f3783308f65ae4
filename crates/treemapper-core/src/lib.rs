//! Core mapping engine — templates over dynamic tree values.
//!
//! # Architecture
//!
//! - **[`filters`]** — named pure functions applied in expression
//!   pipelines; built-ins plus a process-wide registry
//! - **[`compiler`]** — walks a template into a cached [`plan::Plan`]
//! - **[`executor`]** — runs the plan: resolves leaves through the
//!   accessor, fans wildcard blocks out into rows, applies operators in
//!   canonical order, emits the target tree
//! - **[`operators`]** — registry of row-bag transforms (`DISTINCT`,
//!   `GROUP BY`, user-registered)
//! - **[`exceptions`]** — thread-local policy + error accumulator
//!
//! # Usage
//! ```
//! use treemapper_core::{query, MapperExceptions};
//! use tree_types::Value;
//!
//! let sources = serde_json::json!({
//!     "user": { "firstName": "alice", "email": " ALICE@EX.COM " }
//! });
//! let template = serde_json::json!({
//!     "name": "{{ user.firstName | ucfirst }}",
//!     "email": "{{ user.email | trim | lower }}"
//! });
//!
//! let result = query()
//!     .source("user", Value::from(sources["user"].clone()))
//!     .template(Value::from(template))
//!     .map()
//!     .unwrap();
//!
//! assert_eq!(
//!     result,
//!     Value::from(serde_json::json!({ "name": "Alice", "email": "alice@ex.com" }))
//! );
//! assert!(!MapperExceptions::has_errors());
//! ```

pub mod compiler;
pub mod error;
pub mod exceptions;
mod executor;
pub mod filters;
pub mod hooks;
pub mod mapper;
pub mod operators;
pub mod options;
pub mod plan;
pub mod query;
pub mod rows;

pub use compiler::TemplateCompiler;
pub use error::MapperError;
pub use exceptions::{ExceptionPolicy, MapperExceptions};
pub use filters::{register_filter, register_seq_filter, FilterRegistry, FilterResult};
pub use hooks::{HookContext, HookSet, HookStage};
pub use mapper::{Mapper, Sources};
pub use operators::{register_operator, OperatorCtx};
pub use options::{MapOptions, DEFAULT_MAX_FAN_OUT};
pub use query::{query, QueryBuilder};
pub use rows::{Row, RowKey, RowKind, RowSet};
