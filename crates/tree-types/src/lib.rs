//! Dynamic tree value model with path-addressed access.
//!
//! # Architecture
//!
//! - **[`Value`]** is the tagged union every component manipulates
//! - **[`Path`]** addresses into a tree (keys, indices, `*` wildcards)
//! - **[`accessor`]** reads shape-preservingly, **[`mutator`]** writes
//!   immutably, creating intermediate structure as needed
//! - **[`adapter`]** is the seam external collaborators implement
//!
//! # Usage
//! ```
//! use tree_types::{accessor, mutator, Path, Value};
//!
//! let root = mutator::set(&Value::map(), &Path::parse("profile.name").unwrap(), &"Alice".into());
//! let name = accessor::get(&root, &Path::parse("profile.name").unwrap(), &Value::Null);
//! assert_eq!(name, Value::from("Alice"));
//! ```

pub mod accessor;
pub mod adapter;
pub mod error;
pub mod mutator;
pub mod path;
pub mod value;

pub use adapter::{FromTreeValue, IntoTreeValue};
pub use error::TreeError;
pub use path::{Path, Segment};
pub use value::Value;
