use crate::{
    data::{FieldMap, FieldValue},
    error::{MalformedBodySnafu, TpsiResult},
};
use serde_json::{Map, Value};
use snafu::OptionExt;

/// Decodes a request body as a JSON object, falling back to
/// `application/x-www-form-urlencoded` when that doesn't work.
pub fn parse_body(bytes: &[u8]) -> TpsiResult<FieldMap> {
    if let Ok(object) = serde_json::from_slice::<Map<String, Value>>(bytes) {
        return Ok(object
            .into_iter()
            .map(|(key, value)| (key, FieldValue::from(value)))
            .collect());
    }

    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes)
        .ok()
        .context(MalformedBodySnafu)?;

    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, FieldValue::Text(value)))
        .collect())
}
