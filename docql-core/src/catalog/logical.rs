use super::{def, native, Arity, FunctionDef, ParamSpec};
use crate::types::ReturnType::Boolean;

const BOOLEAN: ParamSpec = ParamSpec::Uniform(Boolean);

const DEFINITIONS: &[FunctionDef] = &[
    def("and", Arity::Variadic, Boolean, BOOLEAN, native("$and", "AND")),
    def("or", Arity::Variadic, Boolean, BOOLEAN, native("$or", "OR")),
    def("not", Arity::Exact(1), Boolean, BOOLEAN, native("$not", "NOT")),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
