//! Per-thread exception policy and error accumulator.
//!
//! The executor carries a policy struct down the call; this module is
//! the thin thread-local facade that keeps the "set once, call many"
//! idiom without process-global mutable state. The accumulator is reset
//! at the start of each top-level mapping call unless the caller
//! disables that.

use std::cell::{Cell, RefCell};

use crate::error::MapperError;

/// Policy toggles controlling how mapping errors propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionPolicy {
    /// Master switch: when false, all errors are silently dropped and
    /// the mapper returns best-effort output.
    pub enabled: bool,
    /// When true, errors accumulate and execution continues; when
    /// false, the first error raises.
    pub collect: bool,
    /// Treat an accessor miss on a source path as an error.
    pub throw_on_undefined_source: bool,
    /// Treat a missing target parent as an error.
    pub throw_on_undefined_target: bool,
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            collect: false,
            throw_on_undefined_source: false,
            throw_on_undefined_target: false,
        }
    }
}

thread_local! {
    static POLICY: Cell<ExceptionPolicy> = Cell::new(ExceptionPolicy::default());
    static ERRORS: RefCell<Vec<MapperError>> = const { RefCell::new(Vec::new()) };
}

/// The thread-local error context facade.
pub struct MapperExceptions;

impl MapperExceptions {
    /// Current policy for this thread.
    pub fn policy() -> ExceptionPolicy {
        POLICY.with(Cell::get)
    }

    pub fn set_enabled(enabled: bool) {
        Self::update(|p| p.enabled = enabled);
    }

    pub fn set_collect(collect: bool) {
        Self::update(|p| p.collect = collect);
    }

    pub fn set_throw_on_undefined_source(throw: bool) {
        Self::update(|p| p.throw_on_undefined_source = throw);
    }

    pub fn set_throw_on_undefined_target(throw: bool) {
        Self::update(|p| p.throw_on_undefined_target = throw);
    }

    fn update(f: impl FnOnce(&mut ExceptionPolicy)) {
        POLICY.with(|cell| {
            let mut policy = cell.get();
            f(&mut policy);
            cell.set(policy);
        });
    }

    pub fn has_errors() -> bool {
        ERRORS.with(|errors| !errors.borrow().is_empty())
    }

    pub fn get_errors() -> Vec<MapperError> {
        ERRORS.with(|errors| errors.borrow().clone())
    }

    pub fn clear_errors() {
        ERRORS.with(|errors| errors.borrow_mut().clear());
    }

    /// Wraps the accumulated errors in [`MapperError::Collected`], or
    /// `None` when the buffer is empty.
    pub fn collected() -> Option<MapperError> {
        let errors = Self::get_errors();
        if errors.is_empty() {
            None
        } else {
            Some(MapperError::Collected(errors))
        }
    }

    /// Restores the default policy and clears the accumulator.
    pub fn reset() {
        POLICY.with(|cell| cell.set(ExceptionPolicy::default()));
        Self::clear_errors();
    }

    /// Appends a call's collected errors to the thread buffer.
    pub(crate) fn record_all(errors: Vec<MapperError>) {
        if errors.is_empty() {
            return;
        }
        ERRORS.with(|buffer| buffer.borrow_mut().extend(errors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        MapperExceptions::reset();
        let policy = MapperExceptions::policy();
        assert!(policy.enabled);
        assert!(!policy.collect);
        assert!(!policy.throw_on_undefined_source);
        assert!(!policy.throw_on_undefined_target);
    }

    #[test]
    fn toggles_are_thread_local() {
        MapperExceptions::reset();
        MapperExceptions::set_collect(true);
        MapperExceptions::set_throw_on_undefined_source(true);

        let policy = MapperExceptions::policy();
        assert!(policy.collect);
        assert!(policy.throw_on_undefined_source);

        let other_thread = std::thread::spawn(|| MapperExceptions::policy());
        let other_policy = other_thread.join().unwrap();
        assert!(!other_policy.collect);

        MapperExceptions::reset();
    }

    #[test]
    fn accumulator_roundtrip() {
        MapperExceptions::reset();
        assert!(!MapperExceptions::has_errors());

        MapperExceptions::record_all(vec![MapperError::UndefinedSource {
            path: "a.b".to_string(),
        }]);
        assert!(MapperExceptions::has_errors());
        assert_eq!(MapperExceptions::get_errors().len(), 1);

        match MapperExceptions::collected() {
            Some(MapperError::Collected(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected Collected, got {other:?}"),
        }

        MapperExceptions::clear_errors();
        assert!(!MapperExceptions::has_errors());
        assert!(MapperExceptions::collected().is_none());
    }
}
