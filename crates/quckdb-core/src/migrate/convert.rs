//! Loose BSON value coercions.
//!
//! Source documents were written by several service generations, so field
//! types drift. These helpers accept whatever is there and fall back to null
//! rather than failing the row.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};

/// A missing key takes `default`; an explicit null stays null.
#[must_use]
pub fn or_default<'a>(doc: &'a Document, key: &str, default: &'a Bson) -> &'a Bson {
    doc.get(key).unwrap_or(default)
}

/// BSON datetimes become UTC timestamps; everything else becomes `None`.
#[must_use]
pub fn to_timestamp(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    match value {
        Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
        _ => None,
    }
}

/// String form of a scalar. Null and missing stay `None`.
#[must_use]
pub fn text(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::Null | Bson::Undefined => None,
        Bson::String(s) => Some(s.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        other => Some(other.to_string()),
    }
}

/// Like [`text`], truncated to `max_chars` characters.
#[must_use]
pub fn safe_str(value: Option<&Bson>, max_chars: usize) -> Option<String> {
    text(value).map(|s| match s.char_indices().nth(max_chars) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s,
    })
}

/// Truthiness the way loosely typed producers meant it.
#[must_use]
pub fn truthy(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null | Bson::Undefined) => false,
        Some(Bson::Boolean(b)) => *b,
        Some(Bson::Int32(n)) => *n != 0,
        Some(Bson::Int64(n)) => *n != 0,
        Some(Bson::Double(n)) => *n != 0.0,
        Some(Bson::String(s)) => !s.is_empty(),
        Some(Bson::Array(a)) => !a.is_empty(),
        Some(Bson::Document(d)) => !d.is_empty(),
        Some(_) => true,
    }
}

/// Integer value, saturating into `i32`. Non-numeric values give `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn int(value: Option<&Bson>) -> Option<i32> {
    let wide = match value? {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        Bson::Double(n) if n.is_finite() => *n as i64,
        _ => return None,
    };
    Some(wide.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Non-negative total from an aggregation result. Negative or non-integer
/// values count as zero.
#[must_use]
pub fn count(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        _ => 0,
    }
}
