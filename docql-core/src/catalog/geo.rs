use super::{custom, def, per_dialect, Arity, CustomOp, FunctionDef, Mapping, ParamSpec};
use crate::types::ReturnType::{Geopoint, Number};

const DEFINITIONS: &[FunctionDef] = &[
    def(
        "point",
        Arity::Exact(2),
        Geopoint,
        ParamSpec::Uniform(Number),
        custom(CustomOp::Point),
    ),
    def(
        "distance",
        Arity::Exact(2),
        Number,
        ParamSpec::Uniform(Geopoint),
        per_dialect(
            Mapping::Custom(CustomOp::Distance),
            Mapping::Native("ST_Distance"),
            Mapping::Custom(CustomOp::Distance),
            Mapping::Native("STDistance"),
            Mapping::Native("SDO_GEOM.SDO_DISTANCE"),
        ),
    ),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
