//! Function catalog for condition expressions.
//!
//! Every operator is a declarative [`FunctionDef`] record: arity, parameter types,
//! return type and a per-dialect mapping. Native mappings name the MongoDB
//! aggregation operator (or the SQL token for relational dialects); custom mappings
//! are rendered by [`crate::expression::custom`].

mod arithmetic;
mod cast;
mod comparison;
mod datetime;
mod geo;
mod logical;
mod string;
mod trig;

use std::collections::HashMap;

use crate::types::{Dialect, ReturnType};

/// Accepted parameter counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Two or more
    Variadic,
    /// Inclusive bounds
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Variadic => count >= 2,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

/// Expected type of each parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Same type for every position
    Uniform(ReturnType),
    /// One type per position
    Positional(&'static [ReturnType]),
}

impl ParamSpec {
    pub fn expected(self, position: usize) -> ReturnType {
        match self {
            ParamSpec::Uniform(expected) => expected,
            ParamSpec::Positional(list) => list
                .get(position)
                .or_else(|| list.last())
                .copied()
                .unwrap_or(ReturnType::Any),
        }
    }
}

/// Operators with hand-written code generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomOp {
    Trim,
    LTrim,
    RTrim,
    StartsWith,
    EndsWith,
    Left,
    Right,
    Includes,
    In,
    Nin,
    Exists,
    DateAdd,
    DateDiff,
    StrToDate,
    Now,
    Point,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    Native(&'static str),
    Custom(CustomOp),
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: &'static str,
    pub arity: Arity,
    pub returns: ReturnType,
    pub params: ParamSpec,
    pub mapping: [Mapping; 5],
}

impl FunctionDef {
    pub fn mapping(&self, dialect: Dialect) -> Mapping {
        self.mapping[dialect.index()]
    }

    /// Operator key used in condition objects, e.g. `$eq`
    pub fn operator(&self) -> String {
        format!("${}", self.name)
    }
}

pub(crate) const fn def(
    name: &'static str,
    arity: Arity,
    returns: ReturnType,
    params: ParamSpec,
    mapping: [Mapping; 5],
) -> FunctionDef {
    FunctionDef {
        name,
        arity,
        returns,
        params,
        mapping,
    }
}

/// MongoDB operator plus one token shared by the relational dialects
pub(crate) const fn native(mongo: &'static str, sql: &'static str) -> [Mapping; 5] {
    [
        Mapping::Native(mongo),
        Mapping::Native(sql),
        Mapping::Native(sql),
        Mapping::Native(sql),
        Mapping::Native(sql),
    ]
}

/// MongoDB operator plus PostgreSQL, MySQL, SQL Server and Oracle tokens
pub(crate) const fn per_dialect(
    mongo: Mapping,
    postgres: Mapping,
    mysql: Mapping,
    sql_server: Mapping,
    oracle: Mapping,
) -> [Mapping; 5] {
    [mongo, postgres, mysql, sql_server, oracle]
}

pub(crate) const fn custom(op: CustomOp) -> [Mapping; 5] {
    [Mapping::Custom(op); 5]
}

/// Immutable name-keyed set of function definitions
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry holding every built-in operator
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for defs in [
            arithmetic::definitions(),
            string::definitions(),
            logical::definitions(),
            comparison::definitions(),
            trig::definitions(),
            datetime::definitions(),
            geo::definitions(),
            cast::definitions(),
        ] {
            for def in defs {
                registry = registry.with(*def);
            }
        }
        registry
    }

    /// Copy of the registry with one definition added or replaced
    pub fn with(mut self, def: FunctionDef) -> Self {
        self.functions.insert(def.name, def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Look up an operator key such as `$gt`
    pub fn get_operator(&self, key: &str) -> Option<&FunctionDef> {
        key.strip_prefix('$').and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
