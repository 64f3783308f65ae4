//! Opt-in callback points around a mapping call.
//!
//! Hooks fire in declaration order. A hook may mutate the value being
//! written but never the sources. A failing hook is reported through the
//! error accumulator as a `HookFailure` and does not terminate the
//! mapping unless the call is in fail-fast mode.

use std::fmt;
use std::sync::Arc;

use tree_types::Value;

/// Which callback point a hook failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforeAll,
    PreTransform,
    PostTransform,
    AfterAll,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::BeforeAll => "BeforeAll",
            HookStage::PreTransform => "PreTransform",
            HookStage::PostTransform => "PostTransform",
            HookStage::AfterAll => "AfterAll",
        };
        f.write_str(name)
    }
}

/// Context handed to per-leaf hooks.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Dotted target path of the leaf being written.
    pub target_path: String,
    /// The expression source text the value came from, if any.
    pub expression: Option<String>,
}

/// Fired once before mapping starts.
pub type BeforeAllFn = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;
/// Fired per leaf, before and after the value is finalised for writing.
pub type TransformFn = Arc<dyn Fn(&mut Value, &HookContext) -> Result<(), String> + Send + Sync>;
/// Fired once with the finished target tree.
pub type AfterAllFn = Arc<dyn Fn(&mut Value) -> Result<(), String> + Send + Sync>;

/// The hooks attached to one mapping call.
#[derive(Clone, Default)]
pub struct HookSet {
    pub(crate) before_all: Vec<BeforeAllFn>,
    pub(crate) pre_transform: Vec<TransformFn>,
    pub(crate) post_transform: Vec<TransformFn>,
    pub(crate) after_all: Vec<AfterAllFn>,
}

impl HookSet {
    pub fn is_empty(&self) -> bool {
        self.before_all.is_empty()
            && self.pre_transform.is_empty()
            && self.post_transform.is_empty()
            && self.after_all.is_empty()
    }

    pub fn on_before_all(&mut self, hook: impl Fn() -> Result<(), String> + Send + Sync + 'static) {
        self.before_all.push(Arc::new(hook));
    }

    pub fn on_pre_transform(
        &mut self,
        hook: impl Fn(&mut Value, &HookContext) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.pre_transform.push(Arc::new(hook));
    }

    pub fn on_post_transform(
        &mut self,
        hook: impl Fn(&mut Value, &HookContext) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.post_transform.push(Arc::new(hook));
    }

    pub fn on_after_all(
        &mut self,
        hook: impl Fn(&mut Value) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.after_all.push(Arc::new(hook));
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("before_all", &self.before_all.len())
            .field("pre_transform", &self.pre_transform.len())
            .field("post_transform", &self.post_transform.len())
            .field("after_all", &self.after_all.len())
            .finish()
    }
}
