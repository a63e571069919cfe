use super::{custom, def, per_dialect, Arity, CustomOp, FunctionDef, Mapping, ParamSpec};
use crate::types::ReturnType::{Datetime, Number, Text};

const DATE: ParamSpec = ParamSpec::Uniform(Datetime);

/// Date part extraction: MongoDB operator, then the SQL part keyword
const fn part(mongo: &'static str, sql_part: &'static str) -> [Mapping; 5] {
    per_dialect(
        Mapping::Native(mongo),
        Mapping::Native(sql_part),
        Mapping::Native(sql_part),
        Mapping::Native(sql_part),
        Mapping::Native(sql_part),
    )
}

const DEFINITIONS: &[FunctionDef] = &[
    def("year", Arity::Exact(1), Number, DATE, part("$year", "YEAR")),
    def("month", Arity::Exact(1), Number, DATE, part("$month", "MONTH")),
    def("dayOfMonth", Arity::Exact(1), Number, DATE, part("$dayOfMonth", "DAY")),
    def("dayOfWeek", Arity::Exact(1), Number, DATE, part("$dayOfWeek", "DOW")),
    def("dayOfYear", Arity::Exact(1), Number, DATE, part("$dayOfYear", "DOY")),
    def("hour", Arity::Exact(1), Number, DATE, part("$hour", "HOUR")),
    def("minute", Arity::Exact(1), Number, DATE, part("$minute", "MINUTE")),
    def("second", Arity::Exact(1), Number, DATE, part("$second", "SECOND")),
    def(
        "millisecond",
        Arity::Exact(1),
        Number,
        DATE,
        per_dialect(
            Mapping::Native("$millisecond"),
            Mapping::Native("MILLISECONDS"),
            Mapping::NotAvailable,
            Mapping::Native("MILLISECOND"),
            Mapping::NotAvailable,
        ),
    ),
    def(
        "dateAdd",
        Arity::Exact(3),
        Datetime,
        ParamSpec::Positional(&[Datetime, Text, Number]),
        custom(CustomOp::DateAdd),
    ),
    def(
        "dateDiff",
        Arity::Exact(3),
        Number,
        ParamSpec::Positional(&[Datetime, Datetime, Text]),
        custom(CustomOp::DateDiff),
    ),
    def(
        "strToDate",
        Arity::Exact(1),
        Datetime,
        ParamSpec::Uniform(Text),
        custom(CustomOp::StrToDate),
    ),
    def("now", Arity::Exact(0), Datetime, DATE, custom(CustomOp::Now)),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
