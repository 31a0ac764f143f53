//! Scalar readers shared by the expand engine and the structural helpers.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{ExpandError, FieldPath};
use crate::model::WireEnum;

const ARN_PATTERN: &str = r"^arn:[a-z0-9-]+:[a-z0-9-]*:[a-z0-9-]*:(\d{12})?:.+$";

pub(crate) fn required_str(value: &Option<String>, path: &FieldPath) -> Result<String, ExpandError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ExpandError::missing(path.clone())),
    }
}

pub(crate) fn narrow(value: i64, path: &FieldPath) -> Result<i32, ExpandError> {
    i32::try_from(value).map_err(|_| {
        ExpandError::shape(
            path.clone(),
            format!("value {} is out of range for a 32-bit integer", value),
        )
    })
}

pub(crate) fn required_i32(value: Option<i64>, path: &FieldPath) -> Result<i32, ExpandError> {
    let v = value.ok_or_else(|| ExpandError::missing(path.clone()))?;
    narrow(v, path)
}

pub(crate) fn optional_i32(value: Option<i64>, path: &FieldPath) -> Result<Option<i32>, ExpandError> {
    value.map(|v| narrow(v, path)).transpose()
}

pub(crate) fn parse_enum<E: WireEnum>(value: &str, path: &FieldPath) -> Result<E, ExpandError> {
    E::from_wire(value).ok_or_else(|| {
        ExpandError::shape(
            path.clone(),
            format!(
                "'{}' is not a valid {} (expected one of: {})",
                value,
                E::KIND,
                E::expected()
            ),
        )
    })
}

pub(crate) fn required_enum<E: WireEnum>(
    value: &Option<String>,
    path: &FieldPath,
) -> Result<E, ExpandError> {
    let raw = required_str(value, path)?;
    parse_enum(&raw, path)
}

static ARN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARN_PATTERN).expect("ARN pattern is a valid regex"));

pub(crate) fn is_arn(value: &str) -> bool {
    ARN_RE.is_match(value)
}

pub(crate) fn arn(value: &str, path: &FieldPath) -> Result<String, ExpandError> {
    if is_arn(value) {
        Ok(value.to_string())
    } else {
        Err(ExpandError::shape(
            path.clone(),
            format!("'{}' is not a valid ARN", value),
        ))
    }
}

pub(crate) fn required_arn(value: &Option<String>, path: &FieldPath) -> Result<String, ExpandError> {
    let raw = required_str(value, path)?;
    arn(&raw, path)
}

pub(crate) fn arn_list(values: &[String], path: &FieldPath) -> Result<Vec<String>, ExpandError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| arn(v, &path.index(i)))
        .collect()
}
