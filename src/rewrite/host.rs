//! Host/port helpers.

use memchr::memmem;

/// Return the part of `host[:port]` before the first `:`.
///
/// Input without a colon is returned whole. No validation is done, so an
/// IPv6 literal such as `[::1]:80` yields `[`.
pub fn strip_port(authority: &str) -> &str {
    match authority.find(':') {
        Some(idx) => &authority[..idx],
        None => authority,
    }
}

/// Replace every non-overlapping occurrence of `from` in `haystack` with
/// `to`, left to right.
///
/// Works on raw bytes, so header values carrying obs-text and bodies in any
/// ASCII-compatible charset are handled alike.
///
/// If either host is empty the input is returned unchanged: an empty
/// pattern matches everywhere and an empty replacement would erase the
/// host, and both only happen when a request carried no host at all.
///
/// This is plain substring replacement: a host name that appears inside
/// unrelated text (a path segment, a longer host name, a JSON string) is
/// replaced too.
pub fn replace_host(haystack: &[u8], from: &str, to: &str) -> Vec<u8> {
    if from.is_empty() || to.is_empty() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut last = 0;
    for idx in memmem::find_iter(haystack, from.as_bytes()) {
        out.extend_from_slice(&haystack[last..idx]);
        out.extend_from_slice(to.as_bytes());
        last = idx + from.len();
    }
    out.extend_from_slice(&haystack[last..]);
    out
}
