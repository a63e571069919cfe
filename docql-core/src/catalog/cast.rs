use super::{def, per_dialect, Arity, FunctionDef, Mapping, ParamSpec};
use crate::types::ReturnType::{self, Any, Boolean, Datetime, Id, Number, Text};

const ANY: ParamSpec = ParamSpec::Uniform(Any);

/// MongoDB conversion operator plus the SQL target type for `CAST`
const fn cast(mongo: &'static str, sql_type: &'static str) -> [Mapping; 5] {
    per_dialect(
        Mapping::Native(mongo),
        Mapping::Native(sql_type),
        Mapping::Native(sql_type),
        Mapping::Native(sql_type),
        Mapping::Native(sql_type),
    )
}

const fn to(name: &'static str, returns: ReturnType, mapping: [Mapping; 5]) -> FunctionDef {
    def(name, Arity::Exact(1), returns, ANY, mapping)
}

const DEFINITIONS: &[FunctionDef] = &[
    to("toBoolean", Boolean, cast("$toBool", "BOOLEAN")),
    to("toDate", Datetime, cast("$toDate", "TIMESTAMP")),
    to("toDecimal", Number, cast("$toDouble", "DECIMAL")),
    to("toInteger", Number, cast("$toInt", "INTEGER")),
    to(
        "toObjectId",
        Id,
        per_dialect(
            Mapping::Native("$toObjectId"),
            Mapping::NotAvailable,
            Mapping::NotAvailable,
            Mapping::NotAvailable,
            Mapping::NotAvailable,
        ),
    ),
    to("toString", Text, cast("$toString", "VARCHAR")),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
