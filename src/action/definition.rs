use serde_json::{Map, Value};

use docql_core::{Expression, Field, JoinType, ModelId, PullTarget};

use crate::adapter::Method;

/// Prepared documents for a create method
#[derive(Debug, Clone, PartialEq)]
pub enum CreateData {
    One(Map<String, Value>),
    Many(Vec<Map<String, Value>>),
}

/// Update operators besides plain assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Set,
    Unset,
    Inc,
    Mul,
    Min,
    Max,
    Push,
    Pull,
    /// `$pop` and `$shift`; the direction lives in the entry value
    Pop,
}

impl UpdateOp {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$set" => Some(UpdateOp::Set),
            "$unset" => Some(UpdateOp::Unset),
            "$inc" => Some(UpdateOp::Inc),
            "$mul" => Some(UpdateOp::Mul),
            "$min" => Some(UpdateOp::Min),
            "$max" => Some(UpdateOp::Max),
            "$push" => Some(UpdateOp::Push),
            "$pull" => Some(UpdateOp::Pull),
            "$pop" | "$shift" => Some(UpdateOp::Pop),
            _ => None,
        }
    }

    /// MongoDB update operator
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Set => "$set",
            UpdateOp::Unset => "$unset",
            UpdateOp::Inc => "$inc",
            UpdateOp::Mul => "$mul",
            UpdateOp::Min => "$min",
            UpdateOp::Max => "$max",
            UpdateOp::Push => "$push",
            UpdateOp::Pull => "$pull",
            UpdateOp::Pop => "$pop",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Literal(Value),
    /// Compiled `$pull` condition and the kind of array elements it runs over
    Condition(Expression, PullTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEntry {
    pub op: UpdateOp,
    /// Full dotted path, positional segments included
    pub field_name: String,
    pub value: UpdateValue,
}

/// Compiled update instructions.
///
/// `set` holds assignments to base-model fields. Everything addressed through a
/// nested path, and every non-assignment operator, goes to `others`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateData {
    pub set: Map<String, Value>,
    pub others: Vec<UpdateEntry>,
}

impl UpdateData {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.others.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortEntry {
    pub field_name: String,
    pub order: SortOrder,
}

/// Normalized join descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDef {
    pub kind: JoinType,
    /// Output path: the reference field's query path, or the alias of a named join
    pub alias: String,
    /// Reference field behind a simple join
    pub field: Option<Field>,
    pub target: ModelId,
    /// Collection the join reads from
    pub from: String,
    /// Lookup condition of a named join
    pub condition: Option<Expression>,
}

/// Everything one action accumulates before dispatch
#[derive(Debug, Clone, Default)]
pub struct ActionDefinition {
    pub method: Option<Method>,
    pub create_data: Option<CreateData>,
    pub updates: Option<UpdateData>,
    pub select: Option<Vec<String>>,
    pub omit: Option<Vec<String>>,
    pub id: Option<String>,
    pub filter: Option<Expression>,
    pub joins: Vec<JoinDef>,
    pub sort: Vec<SortEntry>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub array_filters: Vec<Expression>,
    pub use_read_replica: bool,
    pub return_count: bool,
}

impl ActionDefinition {
    /// Whether the filter references joined fields, so joins have to run first
    pub fn filter_needs_joins(&self) -> bool {
        !self.joins.is_empty()
            && self
                .filter
                .as_ref()
                .is_some_and(Expression::has_join_field_values)
    }
}
