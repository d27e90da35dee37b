//! Record extraction: one reshaped row into the flat shape that gets stored.
//!
//! Mandatory fields are `name.firstName`, `name.lastName` and `age`. The
//! top-level `name`, `age` and `address` keys are consumed; whatever else the
//! row carried is returned as the record's `extra` bag.

use crate::nested::{Nested, NestedMap};
use crate::validation::ValidationError;
use serde::Serialize;

const FIRST_NAME: &[&str] = &["name", "firstName"];
const LAST_NAME: &[&str] = &["name", "lastName"];
const CONSUMED_KEYS: [&str; 3] = ["name", "age", "address"];

/// A validated person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    /// `firstName lastName`, trimmed.
    pub name: String,
    pub age: i32,
    /// The row's `address` value, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Nested>,
    /// Top-level fields other than `name`, `age` and `address`; `None` when
    /// there are none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<NestedMap>,
}

/// Derive a [`CanonicalRecord`] from a reshaped row.
///
/// # Errors
/// Returns a [`ValidationError`] when a name part is absent or blank, when
/// `age` is absent, or when `age` does not start with an integer that fits in
/// 32 bits.
///
/// # Example
/// ```
/// use rowbeam::{extract, reshape, Header};
///
/// let header: Header = ["name.firstName", "name.lastName", "age", "city"].into_iter().collect();
/// let rec = extract(&reshape(&header, &["Jane", "Doe", "30", "NYC"])).unwrap();
/// assert_eq!(rec.name, "Jane Doe");
/// assert_eq!(rec.age, 30);
/// assert!(rec.address.is_none());
/// assert_eq!(rec.extra.unwrap().get("city").and_then(|v| v.as_leaf()), Some("NYC"));
/// ```
pub fn extract(obj: &NestedMap) -> Result<CanonicalRecord, ValidationError> {
    let first = leaf_at(obj, FIRST_NAME);
    let last = leaf_at(obj, LAST_NAME);
    let age_raw = obj.get("age");

    let mut missing = Vec::new();
    if first.is_empty() {
        missing.push("name.firstName");
    }
    if last.is_empty() {
        missing.push("name.lastName");
    }
    if age_raw.is_none() {
        missing.push("age");
    }
    if !missing.is_empty() {
        return Err(ValidationError::new(format!(
            "missing mandatory fields ({})",
            missing.join(", ")
        ))
        .with_code("missing_mandatory"));
    }

    let age = match age_raw {
        Some(Nested::Leaf(raw)) => parse_age(raw)?,
        _ => {
            return Err(ValidationError::field("age", "expected a single value, found nested fields")
                .with_code("invalid_age"));
        }
    };

    let mut extra = obj.clone();
    for key in CONSUMED_KEYS {
        extra.remove(key);
    }

    Ok(CanonicalRecord {
        name: format!("{first} {last}").trim().to_string(),
        age,
        address: obj.get("address").cloned(),
        extra: (!extra.is_empty()).then_some(extra),
    })
}

fn leaf_at<'a>(obj: &'a NestedMap, path: &[&str]) -> &'a str {
    obj.get_path(path)
        .and_then(Nested::as_leaf)
        .map_or("", str::trim)
}

/// Parse the leading integer of `raw`: an optional sign followed by at least
/// one ASCII digit. Anything after the digits is ignored.
fn parse_age(raw: &str) -> Result<i32, ValidationError> {
    let raw = raw.trim();
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    if digits.is_empty() {
        return Err(ValidationError::field("age", format!("not an integer: {raw:?}"))
            .with_code("invalid_age"));
    }
    let sign_len = raw.len() - unsigned.len();
    raw[..sign_len + digits.len()].parse::<i32>().map_err(|_| {
        ValidationError::field("age", format!("out of range: {raw:?}")).with_code("invalid_age")
    })
}
