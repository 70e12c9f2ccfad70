//! In-place rewriting of header values.

use axum::http::header::{Entry, HeaderMap, HeaderName, HeaderValue};

/// Apply `transform` to the raw bytes of every value of the `name` header.
///
/// A missing header is left missing. Otherwise each value is replaced in
/// place, so the number and order of values never change. Values are handed
/// over as bytes, obs-text included; a rewritten form that is not a legal
/// header value keeps the original.
pub fn rewrite_header<F>(headers: &mut HeaderMap, name: HeaderName, transform: F)
where
    F: Fn(&[u8]) -> Vec<u8>,
{
    let Entry::Occupied(mut entry) = headers.entry(name) else {
        return;
    };

    for value in entry.iter_mut() {
        let rewritten = transform(value.as_bytes());
        if rewritten == value.as_bytes() {
            continue;
        }

        match HeaderValue::from_bytes(&rewritten) {
            Ok(mut new_value) => {
                new_value.set_sensitive(value.is_sensitive());
                *value = new_value;
            }
            Err(_) => {
                tracing::warn!(
                    value = %String::from_utf8_lossy(&rewritten),
                    "Rewritten header value is not valid, keeping original"
                );
            }
        }
    }
}
