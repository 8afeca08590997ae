use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Percent-encode a query parameter value.
///
/// Every character that is not alphanumeric is escaped, including spaces,
/// `=`, `-` and `.`. Non-ASCII letters and digits are left as they are; the
/// HTTP layer escapes them when it builds the final URL.
///
/// # Examples
///
/// ```
/// use tabula_core::request::encode_query_value;
///
/// assert_eq!(encode_query_value("objectId != NULL"), "objectId%20%21%3D%20NULL");
/// assert_eq!(encode_query_value("café-1"), "café%2D1");
/// ```
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    let mut buffer = [0_u8; 4];
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            encoded.push(ch);
        } else {
            encoded.extend(utf8_percent_encode(
                ch.encode_utf8(&mut buffer),
                NON_ALPHANUMERIC,
            ));
        }
    }
    encoded
}

/// Join values with commas, the list syntax the service expects.
pub(crate) fn join_list(values: &[String]) -> String {
    values.join(",")
}
