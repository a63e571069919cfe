//! Format checks and dialect encodings used by field coercion.

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{json, Value};

use crate::types::Dialect;

pub const MAX_EMAIL_LENGTH: usize = 320;
pub const MAX_LINK_LENGTH: usize = 2048;
pub const MAX_PHONE_LENGTH: usize = 16;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").expect("email pattern")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern"));

pub fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, _)) if local.len() <= 64 => EMAIL_RE.is_match(value),
        _ => false,
    }
}

/// Absolute http(s) URL with a host
pub fn is_link(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Digits with an optional leading `+`; spaces, dashes and parentheses are ignored
pub fn is_mobile_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&compact)
}

pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && hex::decode(value).is_ok()
}

pub fn is_base64(value: &str) -> bool {
    base64::engine::general_purpose::STANDARD.decode(value).is_ok()
}

/// Round half away from zero to `digits` decimal places
pub fn round_half_up(value: f64, digits: u32) -> f64 {
    match Decimal::from_f64(value) {
        Some(decimal) => decimal
            .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(value),
        None => {
            let factor = 10f64.powi(digits as i32);
            (value * factor).round() / factor
        }
    }
}

/// Number as stored: integral values stay integers
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        json!(value)
    }
}

/// Textual form of a scalar, `None` for objects and arrays
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// Date/timestamp literal in the dialect's wire form
pub fn encode_datetime(value: DateTime<Utc>, dialect: Dialect) -> Value {
    let text = value.to_rfc3339_opts(SecondsFormat::Millis, true);
    if dialect.is_document() {
        json!({ "$date": text })
    } else {
        Value::String(text)
    }
}

pub fn encode_object_id(value: &str) -> Value {
    json!({ "$oid": value })
}

pub fn encode_binary(value: &str, dialect: Dialect) -> Value {
    if dialect.is_document() {
        json!({ "$binary": { "base64": value, "subType": "00" } })
    } else {
        Value::String(value.to_string())
    }
}

pub fn encode_geo_point(lng: f64, lat: f64, dialect: Dialect) -> Value {
    match dialect {
        Dialect::MongoDb => json!({ "type": "Point", "coordinates": [lng, lat] }),
        Dialect::PostgreSql | Dialect::MySql => Value::String(format!("POINT({}, {})", lng, lat)),
        Dialect::SqlServer => {
            Value::String(format!("geography::Point({}, {}, 4326)", lng, lat))
        }
        Dialect::Oracle => Value::String(format!(
            "SDO_GEOMETRY(2001, 4326, SDO_POINT_TYPE({}, {}, NULL), NULL, NULL)",
            lng, lat
        )),
    }
}
