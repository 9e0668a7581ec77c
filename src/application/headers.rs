use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
    USER_AGENT,
};
use crate::domain::ExtractedBody;

/// Collapses the engine's raw header pairs into a `HeaderMap`. Later pairs
/// replace earlier pairs with the same name; pairs that are not valid HTTP
/// header names or values are dropped.
pub fn headers_from_raw(raw: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(raw.len());
    for (name, value) in raw {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(_) => continue,
        };
        let value = match HeaderValue::from_str(value) {
            Ok(value) => value,
            Err(_) => continue,
        };
        headers.insert(name, value);
    }
    headers
}

/// Fills in the request headers the caller did not set, just before a
/// send. Caller-supplied values always win, except Content-Length, which
/// is forced to the body's known length.
pub fn finalize_request_headers(
    headers: &mut HeaderMap,
    method: &str,
    body: &ExtractedBody,
    user_agent: &str,
) {
    if !headers.contains_key(ACCEPT) {
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    }
    if !headers.contains_key(ACCEPT_ENCODING) {
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    }
    if !headers.contains_key(USER_AGENT) {
        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
    }
    if let Some(content_type) = &body.content_type {
        if !headers.contains_key(CONTENT_TYPE) {
            if let Ok(value) = HeaderValue::from_str(content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
    }
    if body.stream.is_none() && matches!(method, "POST" | "PUT") {
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    } else if body.stream.is_some() {
        if let Some(length) = body.length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
    }
}
