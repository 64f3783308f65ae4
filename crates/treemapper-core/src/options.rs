//! Per-call mapping options.

use crate::exceptions::ExceptionPolicy;
use crate::hooks::HookSet;

/// Default ceiling on rows a wildcard block may expand to.
pub const DEFAULT_MAX_FAN_OUT: usize = 100_000;

/// Options for one mapping call.
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Omit output keys whose leaf resolved to Null (key by key).
    pub skip_null: bool,
    /// Emit Seq-kind fan-outs as dense sequences; with the flag off,
    /// surviving original positions are preserved as map keys.
    pub reindex_wildcard: bool,
    /// Ceiling on rows per wildcard block before `FanOutExceeded`.
    pub max_fan_out: usize,
    /// Overrides the thread-local exception policy for this call.
    pub policy: Option<ExceptionPolicy>,
    /// Keep previously accumulated errors instead of resetting at the
    /// start of the call.
    pub preserve_errors: bool,
    /// Callback points fired during the call.
    pub hooks: HookSet,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            skip_null: true,
            reindex_wildcard: true,
            max_fan_out: DEFAULT_MAX_FAN_OUT,
            policy: None,
            preserve_errors: false,
            hooks: HookSet::default(),
        }
    }
}
