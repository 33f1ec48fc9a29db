//! Header value encoding.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes escaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` the way `encodeURIComponent` does.
///
/// ```
/// use keepsake_server::encode_uri_component;
///
/// assert_eq!(encode_uri_component("first dance (1).mp4"), "first%20dance%20(1).mp4");
/// assert_eq!(encode_uri_component("חינה.jpg"), "%D7%97%D7%99%D7%A0%D7%94.jpg");
/// ```
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// `Content-Disposition` value forcing a download named `filename` (RFC 5987).
///
/// ```
/// use keepsake_server::attachment_disposition;
///
/// assert_eq!(
///     attachment_disposition("a b.jpg"),
///     "attachment; filename*=UTF-8''a%20b.jpg"
/// );
/// ```
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename*=UTF-8''{}", encode_uri_component(filename))
}
