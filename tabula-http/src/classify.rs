//! Turning raw responses into results.
//!
//! A response is a fault when its status is outside 2xx or its body is a
//! `{code, message}` object; anything else is decoded as the operation's
//! success type.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Fault, PersistenceError};
use crate::transport::RawResponse;

const FAULT_KEYS: [&str; 3] = ["code", "message", "errorData"];

/// Decode a successful body as `T`, or surface the fault.
///
/// # Errors
///
/// [`PersistenceError::Fault`] for fault responses and
/// [`PersistenceError::Decode`] when the body is not a `T`.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, Value};
/// use tabula_http::{PersistenceError, RawResponse, classify};
///
/// let ok = RawResponse::new(200, br#"{"name":"a"}"#.to_vec());
/// let map: Map<String, Value> = classify(&ok)?;
/// assert_eq!(map["name"], "a");
///
/// let fault = RawResponse::new(400, br#"{"code":1000,"message":"no table"}"#.to_vec());
/// let err = classify::<Value>(&fault).unwrap_err();
/// assert!(matches!(err, PersistenceError::Fault(f) if f.code == 1000));
/// # Ok::<(), PersistenceError>(())
/// ```
pub fn classify<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, PersistenceError> {
    if let Some(fault) = fault(raw) {
        return Err(fault.into());
    }
    Ok(serde_json::from_slice(&raw.body)?)
}

/// Decode a count body: a bare decimal integer.
///
/// # Errors
///
/// [`PersistenceError::Fault`] for fault responses and
/// [`PersistenceError::InvalidCount`] for anything that is not an integer.
pub fn decode_count(raw: &RawResponse) -> Result<i64, PersistenceError> {
    if let Some(fault) = fault(raw) {
        return Err(fault.into());
    }
    let text = raw.text();
    text.trim()
        .parse()
        .map_err(|_| PersistenceError::InvalidCount { body: text })
}

/// Decode a single-object deletion body, `{"deletionTime": <integer>}`.
///
/// The first value of the object is taken regardless of its key.
///
/// # Errors
///
/// As [`classify`], plus [`PersistenceError::UnexpectedPayload`] when the
/// first value is missing or not an integer.
pub fn decode_deletion(raw: &RawResponse) -> Result<i64, PersistenceError> {
    let body: Map<String, Value> = classify(raw)?;
    body.values()
        .next()
        .and_then(Value::as_i64)
        .ok_or(PersistenceError::UnexpectedPayload {
            expected: "an integer deletion time",
        })
}

/// The fault carried by `raw`, if any.
#[must_use]
pub fn fault(raw: &RawResponse) -> Option<Fault> {
    let body = serde_json::from_slice::<Value>(&raw.body).ok();
    if raw.is_success() {
        return body
            .filter(is_fault_shaped)
            .and_then(|value| serde_json::from_value::<Fault>(value).ok())
            .map(|parsed| Fault {
                status: raw.status,
                ..parsed
            });
    }
    let parsed = body.and_then(|value| serde_json::from_value::<Fault>(value).ok());
    Some(match parsed {
        Some(parsed) if !parsed.message.is_empty() => Fault {
            status: raw.status,
            ..parsed
        },
        _ => Fault {
            code: i64::from(raw.status),
            message: raw.text(),
            status: raw.status,
        },
    })
}

fn is_fault_shaped(value: &Value) -> bool {
    let Value::Object(object) = value else {
        return false;
    };
    object.get("code").is_some_and(Value::is_number)
        && object.get("message").is_some_and(Value::is_string)
        && object.keys().all(|key| FAULT_KEYS.contains(&key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse::new(status, body.as_bytes().to_vec())
    }

    #[rstest]
    fn success_body_decodes() {
        let list: Vec<Value> =
            classify(&raw(200, r#"[{"name":"a"},{"name":"b"}]"#)).expect("body should decode");
        assert_eq!(list.len(), 2);
    }

    #[rstest]
    fn error_status_with_fault_body() {
        let fault = fault(&raw(404, r#"{"code":1009,"message":"Table not found"}"#))
            .expect("response should be a fault");
        assert_eq!(
            fault,
            Fault {
                code: 1009,
                message: "Table not found".into(),
                status: 404,
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("<html>Bad gateway</html>")]
    #[case(r#"{"unexpected":true}"#)]
    fn error_status_without_fault_body_uses_status(#[case] body: &str) {
        let fault = fault(&raw(502, body)).expect("response should be a fault");
        assert_eq!(fault.code, 502);
        assert_eq!(fault.status, 502);
        assert_eq!(fault.message, body);
    }

    #[rstest]
    fn fault_shaped_success_body_is_a_fault() {
        let err = classify::<Value>(&raw(200, r#"{"code":3064,"message":"Not existing"}"#))
            .expect_err("body should be a fault");
        assert!(matches!(err, PersistenceError::Fault(fault) if fault.code == 3064));
    }

    #[rstest]
    fn record_with_code_column_is_not_a_fault() {
        let body = r#"{"code":7,"message":"hi","objectId":"x1"}"#;
        let map: Map<String, Value> = classify(&raw(200, body)).expect("record should decode");
        assert_eq!(map["objectId"], "x1");
    }

    #[rstest]
    fn undecodable_body_is_a_decode_error() {
        let err = classify::<Vec<Value>>(&raw(200, "{}")).expect_err("shape should not match");
        assert!(matches!(err, PersistenceError::Decode { .. }));
    }

    #[rstest]
    #[case("42", 42)]
    #[case(" 7\n", 7)]
    #[case("0", 0)]
    fn counts_decode(#[case] body: &str, #[case] expected: i64) {
        assert_eq!(decode_count(&raw(200, body)).expect("count"), expected);
    }

    #[rstest]
    #[case("forty")]
    #[case("4.5")]
    #[case("")]
    fn non_numeric_count_is_rejected(#[case] body: &str) {
        let err = decode_count(&raw(200, body)).expect_err("count should be rejected");
        assert!(matches!(err, PersistenceError::InvalidCount { body: text } if text == body));
    }

    #[rstest]
    fn deletion_time_is_the_first_value() {
        let time = decode_deletion(&raw(200, r#"{"deletionTime":1700000000000}"#))
            .expect("deletion should decode");
        assert_eq!(time, 1_700_000_000_000);
    }

    #[rstest]
    #[case("{}")]
    #[case(r#"{"deletionTime":"soon"}"#)]
    fn deletion_without_integer_is_unexpected(#[case] body: &str) {
        let err = decode_deletion(&raw(200, body)).expect_err("deletion should be rejected");
        assert!(matches!(err, PersistenceError::UnexpectedPayload { .. }));
    }
}
