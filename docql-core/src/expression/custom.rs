//! Code generation for operators without a one-to-one MongoDB counterpart.

use serde_json::{json, Value};

use super::Expression;
use crate::catalog::CustomOp;

/// Mean earth radius, distances come out in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Render a custom operator from its already rendered arguments.
/// `params` are the source nodes, needed where static operands change the output.
pub fn render(op: CustomOp, args: Vec<Value>, params: &[Expression]) -> Value {
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or(Value::Null);

    match op {
        CustomOp::Trim => json!({ "$trim": { "input": next() } }),
        CustomOp::LTrim => json!({ "$ltrim": { "input": next() } }),
        CustomOp::RTrim => json!({ "$rtrim": { "input": next() } }),
        CustomOp::StartsWith => {
            let (text, prefix) = (next(), next());
            json!({ "$eq": [
                { "$substrCP": [text, 0, { "$strLenCP": prefix.clone() }] },
                prefix
            ]})
        }
        CustomOp::EndsWith => {
            let (text, suffix) = (next(), next());
            let start = json!({ "$max": [0, { "$subtract": [
                { "$strLenCP": text.clone() },
                { "$strLenCP": suffix.clone() }
            ]}]});
            json!({ "$eq": [
                { "$substrCP": [text, start, { "$strLenCP": suffix.clone() }] },
                suffix
            ]})
        }
        CustomOp::Left => {
            let (text, count) = (next(), next());
            json!({ "$substrCP": [text, 0, count] })
        }
        CustomOp::Right => {
            let (text, count) = (next(), next());
            let start = json!({ "$max": [0, { "$subtract": [{ "$strLenCP": text.clone() }, count.clone()] }] });
            json!({ "$substrCP": [text, start, count] })
        }
        CustomOp::Includes => {
            let (text, search) = (next(), next());
            let flag = next();
            includes(text, search, params)(flag)
        }
        CustomOp::In => {
            let (value, list) = (next(), next());
            json!({ "$in": [value, { "$ifNull": [list, []] }] })
        }
        CustomOp::Nin => {
            let (value, list) = (next(), next());
            json!({ "$not": [{ "$in": [value, { "$ifNull": [list, []] }] }] })
        }
        CustomOp::Exists => json!({ "$ne": [{ "$type": next() }, "missing"] }),
        CustomOp::DateAdd => {
            let (start, unit, amount) = (next(), next(), next());
            json!({ "$dateAdd": { "startDate": start, "unit": unit, "amount": amount } })
        }
        CustomOp::DateDiff => {
            let (start, end, unit) = (next(), next(), next());
            json!({ "$dateDiff": { "startDate": start, "endDate": end, "unit": unit } })
        }
        CustomOp::StrToDate => json!({ "$dateFromString": { "dateString": next() } }),
        CustomOp::Now => Value::String("$$NOW".to_string()),
        CustomOp::Point => {
            let (lng, lat) = (next(), next());
            json!({ "type": "Point", "coordinates": [lng, lat] })
        }
        CustomOp::Distance => {
            let (from, to) = (next(), next());
            haversine(from, to)
        }
    }
}

/// Regex match on the search text; a static search string is matched literally.
/// The optional third parameter turns on case-insensitive matching.
fn includes(text: Value, search: Value, params: &[Expression]) -> impl FnOnce(Value) -> Value {
    let pattern = match params.get(1) {
        Some(Expression::Static(literal)) => match literal.value().as_str() {
            Some(raw) => Value::String(regex::escape(raw)),
            None => search,
        },
        _ => search,
    };
    let flag_param = params.get(2).cloned();

    move |flag: Value| {
        let matcher = |insensitive: bool| {
            if insensitive {
                json!({ "$regexMatch": { "input": text.clone(), "regex": pattern.clone(), "options": "i" } })
            } else {
                json!({ "$regexMatch": { "input": text.clone(), "regex": pattern.clone() } })
            }
        };
        match flag_param {
            None => matcher(false),
            Some(Expression::Static(literal)) => matcher(literal.value().as_bool().unwrap_or(false)),
            Some(_) => json!({ "$cond": [flag, matcher(true), matcher(false)] }),
        }
    }
}

fn coordinate(point: &Value, position: usize) -> Value {
    json!({ "$degreesToRadians": {
        "$arrayElemAt": [{ "$getField": { "field": "coordinates", "input": point.clone() } }, position]
    }})
}

/// Great-circle distance between two GeoJSON points
fn haversine(from: Value, to: Value) -> Value {
    let (lng1, lat1) = (coordinate(&from, 0), coordinate(&from, 1));
    let (lng2, lat2) = (coordinate(&to, 0), coordinate(&to, 1));
    let half_sin_squared = |delta: Value| {
        json!({ "$pow": [{ "$sin": { "$divide": [delta, 2] } }, 2] })
    };
    let a = json!({ "$add": [
        half_sin_squared(json!({ "$subtract": [lat2.clone(), lat1.clone()] })),
        { "$multiply": [
            { "$cos": lat1 },
            { "$cos": lat2 },
            half_sin_squared(json!({ "$subtract": [lng2, lng1] }))
        ]}
    ]});
    json!({ "$multiply": [2, EARTH_RADIUS_KM, { "$asin": { "$sqrt": a } }] })
}
