//! Executes a compiled [`Plan`] against a set of named sources.
//!
//! Execution is synchronous, single-threaded, and deterministic: the
//! plan is walked left to right, depth first; operator phases inside a
//! wildcard block follow the canonical order (`WHERE`, user operators in
//! textual order, `ORDER BY`, `OFFSET`, `LIMIT`) regardless of how the
//! template declared them.

use std::cmp::Ordering;
use std::collections::HashSet;

use tree_types::{accessor, mutator, Path, Segment, Value};

use crate::error::MapperError;
use crate::exceptions::ExceptionPolicy;
use crate::filters::{self, FilterResult};
use crate::hooks::{HookContext, HookStage};
use crate::operators::{self, OperatorCtx};
use crate::options::MapOptions;
use crate::plan::{MapEntryKey, OperatorCall, Plan};
use crate::rows::{RowKey, RowKind, RowSet};

/// One mapping call in flight.
pub(crate) struct Executor<'a> {
    sources: &'a Value,
    options: &'a MapOptions,
    policy: ExceptionPolicy,
    errors: Vec<MapperError>,
    /// Wildcard bindings of the enclosing blocks, outermost first.
    bindings: Vec<Segment>,
    /// Target path of the node being written, for hook context.
    target_path: Vec<String>,
    /// Unknown filters already reported this call (once per leaf).
    reported_unknown: HashSet<(String, String)>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(sources: &'a Value, options: &'a MapOptions, policy: ExceptionPolicy) -> Self {
        Self {
            sources,
            options,
            policy,
            errors: Vec::new(),
            bindings: Vec::new(),
            target_path: Vec::new(),
            reported_unknown: HashSet::new(),
        }
    }

    /// Runs the plan and hands back the target plus collected errors.
    pub(crate) fn run(mut self, plan: &Plan) -> Result<(Value, Vec<MapperError>), MapperError> {
        let value = self.execute(plan)?.unwrap_or(Value::Null);
        Ok((value, self.errors))
    }

    /// Routes an error according to the active policy.
    ///
    /// Silent mode drops it, collect mode buffers it, fail-fast raises.
    fn report(&mut self, error: MapperError) -> Result<(), MapperError> {
        if !self.policy.enabled {
            return Ok(());
        }
        if self.policy.collect {
            self.errors.push(error);
            return Ok(());
        }
        Err(error)
    }

    /// Executes one plan node. `None` means the node is omitted.
    fn execute(&mut self, plan: &Plan) -> Result<Option<Value>, MapperError> {
        match plan {
            Plan::Literal(value) => Ok(Some(value.clone())),
            Plan::Expression(ir) => self.resolve_leaf(ir),
            Plan::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.target_path.push(i.to_string());
                    let value = self.execute(item)?;
                    self.target_path.pop();
                    out.push(value.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Seq(out)))
            }
            Plan::Map(entries) => self.execute_map(entries),
            Plan::WildcardBlock { operators, body } => self.execute_block(operators, body),
        }
    }

    fn execute_map(
        &mut self,
        entries: &[(MapEntryKey, Plan)],
    ) -> Result<Option<Value>, MapperError> {
        let mut out = Value::map();

        for (key, plan) in entries {
            match key {
                MapEntryKey::Field(name) => {
                    self.target_path.push(name.clone());
                    let value = self.execute(plan)?;
                    let value = match value {
                        Some(v) => self.finish_leaf(v, plan)?,
                        None => None,
                    };
                    self.target_path.pop();

                    if let Some(value) = value {
                        if value.is_null() && self.options.skip_null {
                            continue;
                        }
                        match out.as_map_mut() {
                            Some(map) => {
                                map.insert(name.clone(), value);
                            }
                            // An earlier path write replaced the node
                            // kind; fall back to a path write.
                            None => {
                                let path = Path::from_segments(vec![Segment::Key(name.clone())]);
                                out = mutator::set(&out, &path, &value);
                            }
                        }
                    }
                }
                MapEntryKey::Path(path) => {
                    self.target_path.push(path.emit());
                    let value = self.execute(plan)?;
                    let value = match value {
                        Some(v) => self.finish_leaf(v, plan)?,
                        None => None,
                    };
                    self.target_path.pop();

                    let Some(value) = value else { continue };
                    if value.is_null() && self.options.skip_null {
                        continue;
                    }
                    if self.policy.throw_on_undefined_target {
                        self.check_target_parent(&out, path)?;
                    }
                    out = write_aligned(&out, path, &value);
                }
            }
        }

        Ok(Some(out))
    }

    /// Fires pre/post-transform hooks for expression leaves.
    fn finish_leaf(&mut self, mut value: Value, plan: &Plan) -> Result<Option<Value>, MapperError> {
        let Plan::Expression(ir) = plan else {
            return Ok(Some(value));
        };

        let options = self.options;
        if options.hooks.pre_transform.is_empty() && options.hooks.post_transform.is_empty() {
            return Ok(Some(value));
        }

        let ctx = HookContext {
            target_path: self.target_path.join("."),
            expression: Some(ir.source.clone()),
        };
        for hook in &options.hooks.pre_transform {
            if let Err(cause) = hook(&mut value, &ctx) {
                self.report(MapperError::HookFailure {
                    stage: HookStage::PreTransform,
                    cause,
                })?;
            }
        }
        for hook in &options.hooks.post_transform {
            if let Err(cause) = hook(&mut value, &ctx) {
                self.report(MapperError::HookFailure {
                    stage: HookStage::PostTransform,
                    cause,
                })?;
            }
        }
        Ok(Some(value))
    }

    /// Strict target checking: the wildcard-free parent prefix must
    /// already exist in the target under construction.
    fn check_target_parent(&mut self, target: &Value, path: &Path) -> Result<(), MapperError> {
        if path.len() < 2 {
            return Ok(());
        }
        let parent: Vec<Segment> = path.segments[..path.len() - 1]
            .iter()
            .take_while(|s| !matches!(s, Segment::Wildcard))
            .cloned()
            .collect();
        if parent.is_empty() {
            return Ok(());
        }
        let parent = Path::from_segments(parent);
        let (_, misses) = accessor::get_traced(target, &parent, &Value::Null);
        if !misses.is_empty() {
            self.report(MapperError::UndefinedTarget { path: path.emit() })?;
        }
        Ok(())
    }

    /// Resolves one expression leaf: bind, read, filter, default.
    fn resolve_leaf(&mut self, ir: &template_parser::ExprIr) -> Result<Option<Value>, MapperError> {
        let mut path = ir.path.clone();
        for binding in &self.bindings {
            match path.bind_first_wildcard(binding.clone()) {
                Some(bound) => path = bound,
                None => break,
            }
        }

        let (value, misses) = accessor::get_traced(self.sources, &path, &Value::Null);
        if self.policy.throw_on_undefined_source {
            for miss in misses {
                self.report(MapperError::UndefinedSource { path: miss.emit() })?;
            }
        }

        let mut value = value;
        if !ir.filters.is_empty() {
            match filters::global().apply(value, &ir.filters, &ir.source) {
                Ok(FilterResult::Value(filtered)) => value = filtered,
                Ok(FilterResult::Absent) => return Ok(ir.default.clone()),
                Err(error) => {
                    let duplicate = match &error {
                        MapperError::UnknownFilter { name, snippet } => !self
                            .reported_unknown
                            .insert((snippet.clone(), name.clone())),
                        _ => false,
                    };
                    if !duplicate {
                        self.report(error)?;
                    }
                    // The leaf falls back to its default, or reads as
                    // missing so skip-null can drop it.
                    return Ok(Some(ir.default.clone().unwrap_or(Value::Null)));
                }
            }
        }

        if value.is_null() {
            if let Some(default) = &ir.default {
                value = default.clone();
            }
        }
        Ok(Some(value))
    }

    // ── Wildcard blocks ──

    fn execute_block(
        &mut self,
        operator_calls: &[OperatorCall],
        body: &Plan,
    ) -> Result<Option<Value>, MapperError> {
        let mut rows = self.fan_out(body)?;
        tracing::trace!(rows = rows.len(), "wildcard block fanned out");

        // Canonical phase order, independent of declaration order.
        let mut where_call = None;
        let mut order_call = None;
        let mut offset_call = None;
        let mut limit_call = None;
        let mut user_calls = Vec::new();
        for call in operator_calls {
            match call.name.as_str() {
                "WHERE" => where_call = Some(call),
                "ORDER BY" => order_call = Some(call),
                "OFFSET" => offset_call = Some(call),
                "LIMIT" => limit_call = Some(call),
                _ => user_calls.push(call),
            }
        }

        if let Some(call) = where_call {
            match self.apply_where(&rows, &call.config) {
                Ok(filtered) => rows = filtered,
                Err(error) => self.report(error)?,
            }
        }
        for call in user_calls {
            match operators::lookup(&call.name) {
                Some(operator) => {
                    let bindings = self.bindings.clone();
                    let ctx = OperatorCtx::new(self.sources, &bindings);
                    match operator(rows.clone(), &call.config, &ctx) {
                        Ok(transformed) => rows = transformed,
                        Err(error) => self.report(error)?,
                    }
                }
                None => {
                    self.report(MapperError::UnknownOperator {
                        name: call.name.clone(),
                    })?;
                }
            }
        }
        if let Some(call) = order_call {
            match self.apply_order_by(&rows, &call.config) {
                Ok(sorted) => rows = sorted,
                Err(error) => self.report(error)?,
            }
        }
        if let Some(call) = offset_call {
            if let Some(n) = self.config_count(&call.config)? {
                rows.rows.drain(..n.min(rows.rows.len()));
            }
        }
        if let Some(call) = limit_call {
            if let Some(n) = self.config_count(&call.config)? {
                rows.rows.truncate(n);
            }
        }

        Ok(Some(rows.into_value(self.options.reindex_wildcard)))
    }

    /// Expands the block body over its fan-out domain.
    fn fan_out(&mut self, body: &Plan) -> Result<RowSet, MapperError> {
        let Some(driving) = self.driving_path(body) else {
            // No wildcard expression in the body: a single candidate row.
            let mut rows = RowSet::new(RowKind::Seq);
            let value = self.execute(body)?;
            rows.push(RowKey::Index(0), value.unwrap_or(Value::Null));
            return Ok(rows);
        };

        let wildcard_pos = driving
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Wildcard))
            .expect("driving path contains a wildcard");
        let parent_path = Path::from_segments(driving.segments[..wildcard_pos].to_vec());
        let parent = accessor::get(self.sources, &parent_path, &Value::Null);

        let (kind, keys): (RowKind, Vec<RowKey>) = match &parent {
            Value::Seq(items) => (RowKind::Seq, (0..items.len()).map(RowKey::Index).collect()),
            Value::Map(entries) => (
                RowKind::Map,
                entries.keys().map(|k| RowKey::Key(k.clone())).collect(),
            ),
            _ => (RowKind::Seq, Vec::new()),
        };

        if keys.len() > self.options.max_fan_out {
            self.report(MapperError::FanOutExceeded {
                limit: self.options.max_fan_out,
                observed: keys.len(),
            })?;
            return Ok(RowSet::new(kind));
        }

        let mut rows = RowSet::new(kind);
        for key in keys {
            self.bindings.push(key.segment());
            self.target_path.push(key.to_string());
            let value = self.execute(body);
            self.target_path.pop();
            self.bindings.pop();
            rows.push(key, value?.unwrap_or(Value::Null));
        }
        Ok(rows)
    }

    /// The first wildcard-bearing source path in the body (depth first),
    /// with the enclosing blocks' bindings already applied. It drives
    /// this block's fan-out dimension; aligned paths pair positionally.
    fn driving_path(&self, plan: &Plan) -> Option<Path> {
        match plan {
            Plan::Expression(ir) => {
                let mut path = ir.path.clone();
                for binding in &self.bindings {
                    match path.bind_first_wildcard(binding.clone()) {
                        Some(bound) => path = bound,
                        None => break,
                    }
                }
                path.has_wildcard().then_some(path)
            }
            Plan::Map(entries) => entries.iter().find_map(|(_, p)| self.driving_path(p)),
            Plan::Seq(items) => items.iter().find_map(|p| self.driving_path(p)),
            Plan::WildcardBlock { body, .. } => self.driving_path(body),
            Plan::Literal(_) => None,
        }
    }

    // ── Built-in operator phases ──

    /// `WHERE` — every config entry's projection must equal its value.
    fn apply_where(&self, rows: &RowSet, config: &Value) -> Result<RowSet, MapperError> {
        let Some(conditions) = config.as_map() else {
            return Err(MapperError::InvalidPath {
                path: config.to_string(),
                reason: "WHERE config must be a map of projection to value".to_string(),
            });
        };

        let ctx = OperatorCtx::new(self.sources, &self.bindings);

        let mut out = RowSet::new(rows.kind);
        for row in &rows.rows {
            let mut keep = true;
            for (projection, expected) in conditions {
                let actual = ctx.resolve(projection, Some(&row.key))?;
                let expected = resolve_config_value(expected, &ctx, &row.key)?;
                if !loose_eq(&actual, &expected) {
                    keep = false;
                    break;
                }
            }
            if keep {
                out.rows.push(row.clone());
            }
        }
        Ok(out)
    }

    /// `ORDER BY` — stable multi-key sort; `ASC`/`DESC` per key.
    fn apply_order_by(&self, rows: &RowSet, config: &Value) -> Result<RowSet, MapperError> {
        let specs: Vec<(String, bool)> = match config {
            Value::String(expr) => vec![(expr.clone(), false)],
            Value::Map(entries) => entries
                .iter()
                .map(|(expr, dir)| {
                    let descending = dir
                        .as_str()
                        .map(|d| d.eq_ignore_ascii_case("DESC"))
                        .unwrap_or(false);
                    (expr.clone(), descending)
                })
                .collect(),
            other => {
                return Err(MapperError::InvalidPath {
                    path: other.to_string(),
                    reason: "ORDER BY config must be a map or a string".to_string(),
                });
            }
        };

        let ctx = OperatorCtx::new(self.sources, &self.bindings);

        let mut keyed: Vec<(Vec<Value>, crate::rows::Row)> = Vec::with_capacity(rows.rows.len());
        for row in &rows.rows {
            let mut sort_keys = Vec::with_capacity(specs.len());
            for (expr, _) in &specs {
                sort_keys.push(ctx.resolve(expr, Some(&row.key))?);
            }
            keyed.push((sort_keys, row.clone()));
        }

        keyed.sort_by(|a, b| {
            for (level, (_, descending)) in specs.iter().enumerate() {
                let ordering = compare_values(&a.0[level], &b.0[level]);
                let ordering = if *descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        let mut out = RowSet::new(rows.kind);
        out.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(out)
    }

    /// Resolves a LIMIT/OFFSET config to a row count.
    ///
    /// `None` means the config could not be resolved; the phase is then
    /// skipped (collect mode keeps the unclipped rows).
    fn config_count(&mut self, config: &Value) -> Result<Option<usize>, MapperError> {
        let bindings = self.bindings.clone();
        let ctx = OperatorCtx::new(self.sources, &bindings);
        let value = match resolve_config_value(config, &ctx, &RowKey::Index(0)) {
            Ok(value) => value,
            Err(error) => {
                self.report(error)?;
                return Ok(None);
            }
        };
        match filters::coerce::to_int(&value) {
            Ok(Value::Int(n)) => Ok(Some(n.max(0) as usize)),
            Ok(_) | Err(_) => {
                self.report(MapperError::TypeCoercion {
                    from: value.kind(),
                    to: "int",
                    value_hint: value.to_string(),
                })?;
                Ok(None)
            }
        }
    }

}

/// Writes `value` at a target path, pairing target wildcards with the
/// value's wildcard shape position by position.
///
/// The Nth target wildcard pairs with the Nth nesting level of the
/// value: a Seq binds indices, a Map binds its keys. A scalar against a
/// remaining wildcard falls back to the mutator's broadcast.
fn write_aligned(target: &Value, path: &Path, value: &Value) -> Value {
    if !path.has_wildcard() {
        return mutator::set(target, path, value);
    }

    match value {
        Value::Seq(items) => {
            let mut out = target.clone();
            for (i, item) in items.iter().enumerate() {
                let bound = path
                    .bind_first_wildcard(Segment::Index(i))
                    .expect("path has a wildcard");
                out = write_aligned(&out, &bound, item);
            }
            out
        }
        Value::Map(entries) => {
            let mut out = target.clone();
            for (key, item) in entries {
                let bound = path
                    .bind_first_wildcard(Segment::Key(key.clone()))
                    .expect("path has a wildcard");
                out = write_aligned(&out, &bound, item);
            }
            out
        }
        scalar => mutator::set(target, path, scalar),
    }
}

/// A config value that is itself an expression string resolves against
/// the sources; anything else is a literal.
fn resolve_config_value(
    value: &Value,
    ctx: &OperatorCtx,
    key: &RowKey,
) -> Result<Value, MapperError> {
    match value {
        Value::String(text) if template_parser::is_expression(text) => ctx.resolve(text, Some(key)),
        other => Ok(other.clone()),
    }
}

/// Equality with numeric widening: `100 == 100.0`.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Mixed-type ordering: numbers before strings before Null; booleans
/// sort with numbers, containers between strings and Null.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank_a = type_rank(a);
    let rank_b = type_rank(b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Seq(_) | Value::Map(_), Value::Seq(_) | Value::Map(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => {
            let x = numeric_rank(a);
            let y = numeric_rank(b);
            x.total_cmp(&y)
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => 0,
        Value::String(_) => 1,
        Value::Seq(_) | Value::Map(_) => 2,
        Value::Null => 3,
    }
}

fn numeric_rank(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Bool(b) => *b as i64 as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_eq_widens_numbers() {
        assert!(loose_eq(&Value::Int(100), &Value::Float(100.0)));
        assert!(!loose_eq(&Value::Int(100), &Value::from("100")));
        assert!(loose_eq(&Value::from("x"), &Value::from("x")));
    }

    #[test]
    fn compare_places_numbers_before_strings_before_null() {
        let mut values = vec![
            Value::Null,
            Value::from("b"),
            Value::Int(2),
            Value::from("a"),
            Value::Float(1.5),
        ];
        values.sort_by(compare_values);
        assert_eq!(
            values,
            vec![
                Value::Float(1.5),
                Value::Int(2),
                Value::from("a"),
                Value::from("b"),
                Value::Null,
            ]
        );
    }
}
