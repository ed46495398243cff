//! Scalar resolution.
//!
//! Plain (unquoted, untagged) scalars are resolved implicitly against the
//! patterns of the active schema; quoted and block scalars are always
//! strings. Tagged scalars are resolved explicitly and fail when the text
//! does not fit the tag.
//!
//! The dumper uses the same functions in reverse: a string that would not
//! resolve back to a string when written plain must be quoted.

use std::sync::LazyLock;

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;

use super::types::YamlValue;
use crate::schema::{Schema, Tag};

// The patterns below are literals; compiling them cannot fail.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

static JSON_INT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^-?(?:0|[1-9][0-9]*)$"));

static JSON_FLOAT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$"));

static CORE_INT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"^(?:[-+]?0b[0-1_]+",
        r"|[-+]?0o[0-7_]+",
        r"|[-+]?0x[0-9a-fA-F_]+",
        r"|[-+]?0[0-7_]+",
        r"|[-+]?(?:0|[1-9][0-9_]*)",
        r"|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
    ))
});

static CORE_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"^(?:[-+]?(?:0|[1-9][0-9_]*)(?:\.[0-9_]*)?(?:[eE][-+]?[0-9]+)?",
        r"|\.[0-9_]+(?:[eE][-+]?[0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*",
        r"|[-+]?\.(?:inf|Inf|INF)",
        r"|\.(?:nan|NaN|NAN))$",
    ))
});

static DATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$"));

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})",
        r"(?:[Tt]|[ \t]+)([0-9]{1,2}):([0-9]{2}):([0-9]{2})",
        r"(?:\.([0-9]*))?",
        r"(?:[ \t]*(Z|([-+])([0-9]{1,2})(?::([0-9]{2}))?))?$",
    ))
});

/// Resolve a plain scalar under `schema`.
pub fn resolve_plain(value: &str, schema: Schema) -> YamlValue {
    if schema == Schema::Failsafe {
        return YamlValue::String(value.to_string());
    }
    if is_null(value, schema) {
        return YamlValue::Null;
    }
    if let Some(b) = parse_bool(value, schema) {
        return YamlValue::Bool(b);
    }
    if let Some(n) = parse_int(value, schema) {
        return n;
    }
    if let Some(f) = parse_float(value, schema) {
        return YamlValue::Float(f);
    }
    if schema.supports(Tag::Timestamp) {
        if let Some(ts) = parse_timestamp(value) {
            return YamlValue::Timestamp(ts);
        }
    }
    YamlValue::String(value.to_string())
}

/// Whether a plain `<<` acts as a merge key under `schema`.
pub fn is_merge_key(value: &str, schema: Schema) -> bool {
    value == "<<" && schema.supports(Tag::Merge)
}

/// Whether `value` written as a plain scalar loads back as the same string.
pub fn plain_is_string(value: &str, schema: Schema) -> bool {
    !is_merge_key(value, schema) && resolve_plain(value, schema).is_string()
}

/// Resolve a scalar carrying an explicit tag.
///
/// The caller has already checked that `schema` supports the tag.
pub fn resolve_tagged(tag: Tag, value: &str, schema: Schema) -> Result<YamlValue, String> {
    let resolved = match tag {
        Tag::Str => Some(YamlValue::String(value.to_string())),
        Tag::Null => is_null(value, schema).then_some(YamlValue::Null),
        Tag::Bool => parse_bool(value, schema).map(YamlValue::Bool),
        Tag::Int => parse_int(value, schema),
        Tag::Float => parse_float(value, schema).map(YamlValue::Float),
        Tag::Timestamp => parse_timestamp(value).map(YamlValue::Timestamp),
        Tag::Binary => decode_binary(value).map(YamlValue::Binary),
        Tag::Merge => (value == "<<").then(|| YamlValue::String(value.to_string())),
        Tag::JsUndefined => Some(YamlValue::Undefined),
        Tag::JsRegExp => Some(YamlValue::RegExp(value.to_string())),
        Tag::JsFunction => Some(YamlValue::Function(value.to_string())),
        Tag::Seq | Tag::Map | Tag::Omap | Tag::Pairs | Tag::Set => {
            return Err(format!(
                "unacceptable node kind for {} tag; it should be \"{}\", not \"scalar\"",
                tag,
                tag.kind()
            ));
        }
    };
    resolved.ok_or_else(|| format!("cannot resolve a node with {} explicit tag", tag))
}

fn is_null(value: &str, schema: Schema) -> bool {
    match schema {
        Schema::Failsafe => false,
        Schema::Json => matches!(value, "null" | ""),
        _ => matches!(value, "~" | "null" | "Null" | "NULL" | ""),
    }
}

fn parse_bool(value: &str, schema: Schema) -> Option<bool> {
    match (schema, value) {
        (Schema::Failsafe, _) => None,
        (_, "true") => Some(true),
        (_, "false") => Some(false),
        (Schema::Json, _) => None,
        (_, "True" | "TRUE") => Some(true),
        (_, "False" | "FALSE") => Some(false),
        _ => None,
    }
}

/// Integers too large for i64 become floats, as they would in JSON.
fn parse_int(value: &str, schema: Schema) -> Option<YamlValue> {
    let pattern = match schema {
        Schema::Failsafe => return None,
        Schema::Json => &*JSON_INT,
        _ => &*CORE_INT,
    };
    if !pattern.is_match(value) {
        return None;
    }

    let (negative, body) = split_sign(value);
    let digits: String = body.chars().filter(|c| *c != '_').collect();

    let magnitude = if let Some(bin) = digits.strip_prefix("0b") {
        from_radix(bin, 2)
    } else if let Some(oct) = digits.strip_prefix("0o") {
        from_radix(oct, 8)
    } else if let Some(hex) = digits.strip_prefix("0x") {
        from_radix(hex, 16)
    } else if digits.contains(':') {
        digits
            .split(':')
            .try_fold(0u128, |acc, part| {
                let part = part.parse::<u128>().ok()?;
                acc.checked_mul(60)?.checked_add(part)
            })
    } else if digits.len() > 1 && digits.starts_with('0') {
        from_radix(&digits[1..], 8)
    } else {
        from_radix(&digits, 10)
    }?;

    let signed = i128::try_from(magnitude)
        .ok()
        .map(|m| if negative { -m } else { m })
        .and_then(|m| i64::try_from(m).ok());

    Some(match signed {
        Some(n) => YamlValue::Int(n),
        None => {
            let f = magnitude as f64;
            YamlValue::Float(if negative { -f } else { f })
        }
    })
}

fn from_radix(digits: &str, radix: u32) -> Option<u128> {
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, radix).ok()
}

fn split_sign(value: &str) -> (bool, &str) {
    if let Some(rest) = value.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = value.strip_prefix('+') {
        (false, rest)
    } else {
        (false, value)
    }
}

fn parse_float(value: &str, schema: Schema) -> Option<f64> {
    match schema {
        Schema::Failsafe => return None,
        Schema::Json => {
            if !JSON_FLOAT.is_match(value) {
                return None;
            }
        }
        _ => {
            if !CORE_FLOAT.is_match(value) || value.ends_with('_') {
                return None;
            }
        }
    }

    let cleaned: String = value
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    match cleaned.as_str() {
        ".nan" => return Some(f64::NAN),
        ".inf" | "+.inf" => return Some(f64::INFINITY),
        "-.inf" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if cleaned.contains(':') {
        let (negative, body) = split_sign(&cleaned);
        let total = body.split(':').try_fold(0f64, |acc, part| {
            part.parse::<f64>().ok().map(|p| acc * 60.0 + p)
        })?;
        return Some(if negative { -total } else { total });
    }

    let parsed = cleaned.parse::<f64>().ok()?;
    // JSON has no spelling for infinity; `1e400` stays a string there.
    if schema == Schema::Json && !parsed.is_finite() {
        return None;
    }
    Some(parsed)
}

/// Parse a YAML timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = DATE.captures(value) {
        let date = ymd(&caps[1], &caps[2], &caps[3])?;
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(0, 0, 0)?)));
    }

    let caps = TIMESTAMP.captures(value)?;
    let date = ymd(&caps[1], &caps[2], &caps[3])?;

    let nanos = match caps.get(7) {
        Some(fraction) => {
            let mut digits: String = fraction.as_str().chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            digits.parse::<u32>().ok()?
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
        nanos,
    )?;
    let naive = date.and_time(time);

    let offset_seconds = match (caps.get(9), caps.get(10)) {
        (Some(sign), Some(hours)) => {
            let hours: i32 = hours.as_str().parse().ok()?;
            let minutes: i32 = match caps.get(11) {
                Some(m) => m.as_str().parse().ok()?,
                None => 0,
            };
            let seconds = hours * 3600 + minutes * 60;
            if sign.as_str() == "-" {
                -seconds
            } else {
                seconds
            }
        }
        _ => 0,
    };
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn decode_binary(value: &str) -> Option<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .ok()
}
