use super::{custom, def, native, per_dialect, Arity, CustomOp, FunctionDef, Mapping, ParamSpec};
use crate::types::ReturnType::{Boolean, Number, StaticBoolean, Text};

const TEXT: ParamSpec = ParamSpec::Uniform(Text);
const TEXT_AND_COUNT: ParamSpec = ParamSpec::Positional(&[Text, Number]);

const DEFINITIONS: &[FunctionDef] = &[
    def("concat", Arity::Variadic, Text, TEXT, native("$concat", "CONCAT")),
    def(
        "substring",
        Arity::Exact(3),
        Text,
        ParamSpec::Positional(&[Text, Number, Number]),
        per_dialect(
            Mapping::Native("$substrCP"),
            Mapping::Native("SUBSTRING"),
            Mapping::Native("SUBSTRING"),
            Mapping::Native("SUBSTRING"),
            Mapping::Native("SUBSTR"),
        ),
    ),
    def(
        "length",
        Arity::Exact(1),
        Number,
        TEXT,
        per_dialect(
            Mapping::Native("$strLenCP"),
            Mapping::Native("LENGTH"),
            Mapping::Native("CHAR_LENGTH"),
            Mapping::Native("LEN"),
            Mapping::Native("LENGTH"),
        ),
    ),
    def("lower", Arity::Exact(1), Text, TEXT, native("$toLower", "LOWER")),
    def("upper", Arity::Exact(1), Text, TEXT, native("$toUpper", "UPPER")),
    def(
        "charIndex",
        Arity::Exact(2),
        Number,
        TEXT,
        per_dialect(
            Mapping::Native("$indexOfCP"),
            Mapping::Native("STRPOS"),
            Mapping::Native("LOCATE"),
            Mapping::Native("CHARINDEX"),
            Mapping::Native("INSTR"),
        ),
    ),
    def("trim", Arity::Exact(1), Text, TEXT, custom(CustomOp::Trim)),
    def("ltrim", Arity::Exact(1), Text, TEXT, custom(CustomOp::LTrim)),
    def("rtrim", Arity::Exact(1), Text, TEXT, custom(CustomOp::RTrim)),
    def("startsWith", Arity::Exact(2), Boolean, TEXT, custom(CustomOp::StartsWith)),
    def("endsWith", Arity::Exact(2), Boolean, TEXT, custom(CustomOp::EndsWith)),
    def("left", Arity::Exact(2), Text, TEXT_AND_COUNT, custom(CustomOp::Left)),
    def("right", Arity::Exact(2), Text, TEXT_AND_COUNT, custom(CustomOp::Right)),
    def(
        "includes",
        Arity::Range(2, 3),
        Boolean,
        ParamSpec::Positional(&[Text, Text, StaticBoolean]),
        custom(CustomOp::Includes),
    ),
];

pub(super) fn definitions() -> &'static [FunctionDef] {
    DEFINITIONS
}
