use super::{custom, def, native, Arity, CustomOp, FunctionDef, ParamSpec};
use crate::types::ReturnType::{Any, Array, Boolean, Primitive};

const PRIMITIVE: ParamSpec = ParamSpec::Uniform(Primitive);
const MEMBERSHIP: ParamSpec = ParamSpec::Positional(&[Primitive, Array]);

const DEFINITIONS: &[FunctionDef] = &[
    def("eq", Arity::Exact(2), Boolean, PRIMITIVE, native("$eq", "=")),
    def("neq", Arity::Exact(2), Boolean, PRIMITIVE, native("$ne", "<>")),
    def("lt", Arity::Exact(2), Boolean, PRIMITIVE, native("$lt", "<")),
    def("lte", Arity::Exact(2), Boolean, PRIMITIVE, native("$lte", "<=")),
    def("gt", Arity::Exact(2), Boolean, PRIMITIVE, native("$gt", ">")),
    def("gte", Arity::Exact(2), Boolean, PRIMITIVE, native("$gte", ">=")),
    def("in", Arity::Exact(2), Boolean, MEMBERSHIP, custom(CustomOp::In)),
    def("nin", Arity::Exact(2), Boolean, MEMBERSHIP, custom(CustomOp::Nin)),
    def("exists", Arity::Exact(1), Boolean, ParamSpec::Uniform(Any), custom(CustomOp::Exists)),
    def("ifNull", Arity::Exact(2), Any, ParamSpec::Uniform(Any), native("$ifNull", "COALESCE")),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
