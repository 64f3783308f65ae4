//! Fluent mapping API.
//!
//! ```
//! use treemapper_core::query;
//! use tree_types::Value;
//!
//! let result = query()
//!     .source("user", Value::from(serde_json::json!({ "name": "alice" })))
//!     .template(Value::from(serde_json::json!({ "n": "{{ user.name | ucfirst }}" })))
//!     .map()
//!     .unwrap();
//! assert_eq!(result, Value::from(serde_json::json!({ "n": "Alice" })));
//! ```

use tree_types::Value;

use crate::error::MapperError;
use crate::exceptions::ExceptionPolicy;
use crate::hooks::HookContext;
use crate::mapper::{Mapper, Sources};
use crate::options::MapOptions;

/// Starts a fluent mapping query.
pub fn query() -> QueryBuilder {
    QueryBuilder::new()
}

/// Builder collecting sources, template, and options for one call.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    sources: Sources,
    template: Option<Value>,
    options: MapOptions,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            sources: Sources::new(),
            template: None,
            options: MapOptions::default(),
        }
    }

    /// Adds a named source.
    pub fn source(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.sources.insert(name, value);
        self
    }

    /// Replaces the whole source set.
    pub fn sources(mut self, sources: Sources) -> Self {
        self.sources = sources;
        self
    }

    pub fn template(mut self, template: impl Into<Value>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn skip_null(mut self, skip: bool) -> Self {
        self.options.skip_null = skip;
        self
    }

    pub fn reindex_wildcard(mut self, reindex: bool) -> Self {
        self.options.reindex_wildcard = reindex;
        self
    }

    pub fn max_fan_out(mut self, limit: usize) -> Self {
        self.options.max_fan_out = limit;
        self
    }

    /// Overrides the thread-local exception policy for this call.
    pub fn policy(mut self, policy: ExceptionPolicy) -> Self {
        self.options.policy = Some(policy);
        self
    }

    pub fn preserve_errors(mut self, preserve: bool) -> Self {
        self.options.preserve_errors = preserve;
        self
    }

    pub fn before_all(
        mut self,
        hook: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.options.hooks.on_before_all(hook);
        self
    }

    pub fn pre_transform(
        mut self,
        hook: impl Fn(&mut Value, &HookContext) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.options.hooks.on_pre_transform(hook);
        self
    }

    pub fn post_transform(
        mut self,
        hook: impl Fn(&mut Value, &HookContext) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.options.hooks.on_post_transform(hook);
        self
    }

    pub fn after_all(
        mut self,
        hook: impl Fn(&mut Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.options.hooks.on_after_all(hook);
        self
    }

    /// Executes the query.
    pub fn map(self) -> Result<Value, MapperError> {
        let template = self.template.ok_or_else(|| MapperError::InvalidPath {
            path: String::new(),
            reason: "query has no template".to_string(),
        })?;
        Mapper::map(&self.sources, &template, &self.options)
    }

    /// Executes the query against several templates.
    pub fn map_many(self, templates: &[Value]) -> Result<Vec<Value>, MapperError> {
        Mapper::map_many(&self.sources, templates, &self.options)
    }
}
