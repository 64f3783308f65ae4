//! The top-level mapping entry points.

use indexmap::IndexMap;
use rayon::prelude::*;

use tree_types::Value;

use crate::compiler::TemplateCompiler;
use crate::error::MapperError;
use crate::exceptions::{ExceptionPolicy, MapperExceptions};
use crate::executor::Executor;
use crate::hooks::HookStage;
use crate::options::MapOptions;

/// Named source trees for one mapping call.
///
/// Internally a single map value; expression paths resolve against it,
/// with the first path segment naming the source.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    root: Value,
}

impl Sources {
    pub fn new() -> Self {
        Self { root: Value::map() }
    }

    /// Adds a named source, builder style.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        if self.root.as_map().is_none() {
            self.root = Value::map();
        }
        self.root
            .as_map_mut()
            .expect("sources root is a map")
            .insert(name.to_string(), value.into());
    }

    /// The combined root value (source name → tree).
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_map().map(|m| m.is_empty()).unwrap_or(true)
    }
}

impl From<IndexMap<String, Value>> for Sources {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self {
            root: Value::Map(map),
        }
    }
}

/// The mapping engine facade.
pub struct Mapper;

impl Mapper {
    /// Maps `template` against `sources`, returning the target tree.
    ///
    /// The thread-local error accumulator is reset at the start of the
    /// call unless `options.preserve_errors` is set; errors collected
    /// during the call are appended to it.
    pub fn map(
        sources: &Sources,
        template: &Value,
        options: &MapOptions,
    ) -> Result<Value, MapperError> {
        if !options.preserve_errors {
            MapperExceptions::clear_errors();
        }
        let policy = options.policy.unwrap_or_else(MapperExceptions::policy);

        let mut call_errors = Vec::new();

        for hook in &options.hooks.before_all {
            if let Err(cause) = hook() {
                let error = MapperError::HookFailure {
                    stage: HookStage::BeforeAll,
                    cause,
                };
                route(policy, error, &mut call_errors)?;
            }
        }

        let plan = match TemplateCompiler::compile(template) {
            Ok(plan) => plan,
            Err(error) => {
                route(policy, error, &mut call_errors)?;
                MapperExceptions::record_all(call_errors);
                return Ok(Value::Null);
            }
        };

        tracing::debug!(plan = plan.kind(), "executing mapping");
        let executor = Executor::new(sources.root(), options, policy);
        let (mut value, errors) = match executor.run(&plan) {
            Ok(done) => done,
            Err(error) => {
                MapperExceptions::record_all(call_errors);
                return Err(error);
            }
        };
        call_errors.extend(errors);

        for hook in &options.hooks.after_all {
            if let Err(cause) = hook(&mut value) {
                let error = MapperError::HookFailure {
                    stage: HookStage::AfterAll,
                    cause,
                };
                if let Err(raised) = route(policy, error, &mut call_errors) {
                    MapperExceptions::record_all(call_errors);
                    return Err(raised);
                }
            }
        }

        MapperExceptions::record_all(call_errors);
        Ok(value)
    }

    /// Maps several templates sequentially against the same sources.
    ///
    /// Errors from all templates accumulate into one buffer.
    pub fn map_many(
        sources: &Sources,
        templates: &[Value],
        options: &MapOptions,
    ) -> Result<Vec<Value>, MapperError> {
        if !options.preserve_errors {
            MapperExceptions::clear_errors();
        }
        let mut per_template = options.clone();
        per_template.preserve_errors = true;

        let mut results = Vec::with_capacity(templates.len());
        for template in templates {
            results.push(Self::map(sources, template, &per_template)?);
        }
        Ok(results)
    }

    /// Maps several templates in parallel against the same sources.
    ///
    /// Each template gets its own call context — no shared mutable
    /// state. Results come back in input order; errors collected on the
    /// worker threads are merged into this thread's accumulator, also
    /// in input order.
    pub fn map_batch(
        sources: &Sources,
        templates: &[Value],
        options: &MapOptions,
    ) -> Vec<Result<Value, MapperError>> {
        // Rayon may run closures on this very thread, and each closure
        // drains the thread accumulator; park the caller's buffer first.
        let preserved = if options.preserve_errors {
            MapperExceptions::get_errors()
        } else {
            Vec::new()
        };
        MapperExceptions::clear_errors();

        // Policies are thread-local; pin the caller's resolved policy so
        // worker threads do not consult their own.
        let mut worker_options = options.clone();
        worker_options.policy =
            Some(options.policy.unwrap_or_else(MapperExceptions::policy));

        let outcomes: Vec<(Result<Value, MapperError>, Vec<MapperError>)> = templates
            .par_iter()
            .map(|template| {
                let result = Self::map(sources, template, &worker_options);
                let errors = MapperExceptions::get_errors();
                MapperExceptions::clear_errors();
                (result, errors)
            })
            .collect();

        MapperExceptions::clear_errors();
        MapperExceptions::record_all(preserved);

        let mut results = Vec::with_capacity(outcomes.len());
        for (result, errors) in outcomes {
            MapperExceptions::record_all(errors);
            results.push(result);
        }
        results
    }
}

/// Routes a call-level error per policy: drop, buffer, or raise.
fn route(
    policy: ExceptionPolicy,
    error: MapperError,
    buffer: &mut Vec<MapperError>,
) -> Result<(), MapperError> {
    if !policy.enabled {
        return Ok(());
    }
    if policy.collect {
        buffer.push(error);
        return Ok(());
    }
    Err(error)
}
