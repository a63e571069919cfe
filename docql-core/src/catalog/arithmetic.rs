use super::{def, native, Arity, FunctionDef, ParamSpec};
use crate::types::ReturnType::Number;

const NUMBER: ParamSpec = ParamSpec::Uniform(Number);

const DEFINITIONS: &[FunctionDef] = &[
    def("add", Arity::Variadic, Number, NUMBER, native("$add", "+")),
    def("subtract", Arity::Exact(2), Number, NUMBER, native("$subtract", "-")),
    def("multiply", Arity::Variadic, Number, NUMBER, native("$multiply", "*")),
    def("divide", Arity::Exact(2), Number, NUMBER, native("$divide", "/")),
    def("mod", Arity::Exact(2), Number, NUMBER, native("$mod", "MOD")),
    def("abs", Arity::Exact(1), Number, NUMBER, native("$abs", "ABS")),
    def("ceil", Arity::Exact(1), Number, NUMBER, native("$ceil", "CEIL")),
    def("floor", Arity::Exact(1), Number, NUMBER, native("$floor", "FLOOR")),
    def("round", Arity::Exact(2), Number, NUMBER, native("$round", "ROUND")),
    def("sqrt", Arity::Exact(1), Number, NUMBER, native("$sqrt", "SQRT")),
    def("pow", Arity::Exact(2), Number, NUMBER, native("$pow", "POWER")),
    def("exp", Arity::Exact(1), Number, NUMBER, native("$exp", "EXP")),
    def("ln", Arity::Exact(1), Number, NUMBER, native("$ln", "LN")),
    def("log", Arity::Exact(2), Number, NUMBER, native("$log", "LOG")),
    def("log10", Arity::Exact(1), Number, NUMBER, native("$log10", "LOG10")),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
