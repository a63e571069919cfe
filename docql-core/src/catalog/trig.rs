use super::{def, native, Arity, FunctionDef, ParamSpec};
use crate::types::ReturnType::Number;

const NUMBER: ParamSpec = ParamSpec::Uniform(Number);

const DEFINITIONS: &[FunctionDef] = &[
    def("sin", Arity::Exact(1), Number, NUMBER, native("$sin", "SIN")),
    def("cos", Arity::Exact(1), Number, NUMBER, native("$cos", "COS")),
    def("tan", Arity::Exact(1), Number, NUMBER, native("$tan", "TAN")),
    def("asin", Arity::Exact(1), Number, NUMBER, native("$asin", "ASIN")),
    def("acos", Arity::Exact(1), Number, NUMBER, native("$acos", "ACOS")),
    def("atan", Arity::Exact(1), Number, NUMBER, native("$atan", "ATAN")),
    def("atan2", Arity::Exact(2), Number, NUMBER, native("$atan2", "ATAN2")),
    def("sinh", Arity::Exact(1), Number, NUMBER, native("$sinh", "SINH")),
    def("cosh", Arity::Exact(1), Number, NUMBER, native("$cosh", "COSH")),
    def("tanh", Arity::Exact(1), Number, NUMBER, native("$tanh", "TANH")),
    def("asinh", Arity::Exact(1), Number, NUMBER, native("$asinh", "ASINH")),
    def("acosh", Arity::Exact(1), Number, NUMBER, native("$acosh", "ACOSH")),
    def("atanh", Arity::Exact(1), Number, NUMBER, native("$atanh", "ATANH")),
    def("degrees", Arity::Exact(1), Number, NUMBER, native("$radiansToDegrees", "DEGREES")),
    def("radians", Arity::Exact(1), Number, NUMBER, native("$degreesToRadians", "RADIANS")),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
