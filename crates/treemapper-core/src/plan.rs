//! The compiled, cacheable form of a template.

use std::sync::Arc;

use template_parser::ExprIr;
use tree_types::{Path, Value};

/// How a map entry addresses the target.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEntryKey {
    /// A plain output field name.
    Field(String),
    /// A dotted (or wildcard) target path, written via the mutator.
    Path(Path),
}

/// One operator key lifted out of a wildcard block, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCall {
    pub name: String,
    pub config: Value,
}

/// A node of the execution plan, mirroring the template tree.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Emitted verbatim.
    Literal(Value),
    /// An expression leaf, shared through the expression cache.
    Expression(Arc<ExprIr>),
    /// Output map; entries evaluated in declared order.
    Map(Vec<(MapEntryKey, Plan)>),
    /// Output sequence.
    Seq(Vec<Plan>),
    /// A fan-out block: operator calls plus the row body.
    WildcardBlock {
        operators: Vec<OperatorCall>,
        body: Box<Plan>,
    },
}

impl Plan {
    /// Variant name for tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Plan::Literal(_) => "literal",
            Plan::Expression(_) => "expression",
            Plan::Map(_) => "map",
            Plan::Seq(_) => "seq",
            Plan::WildcardBlock { .. } => "wildcard-block",
        }
    }
}
