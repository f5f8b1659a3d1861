//! Conversion between `file:` URIs and canonical paths.

use crate::canonical::{CanonicalPath, from_local, is_separator};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::Url;

/// Characters escaped in a single path segment when building a `file:` URI.
/// Matches what editors write, so a round trip reproduces their encoding of
/// the common cases (spaces, `#`, `%`).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Parse a `file:` URI into a canonical local path.
///
/// The path is percent-decoded (editors encode the drive colon as `%3A`), and
/// a host component becomes a UNC share. The result is not checked for
/// existence. Returns `None` for other schemes and for anything `url` can't
/// parse.
pub fn from_file_uri(raw: &str) -> Option<CanonicalPath> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let decoded = percent_decode_str(url.path()).decode_utf8().ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() && !host.eq_ignore_ascii_case("localhost") => {
            from_local(&format!("//{host}{decoded}"))
        },
        _ => from_local(&decoded),
    }
}

/// Render a canonical path as a `file:` URI (`C:\proj\a b` becomes
/// `file:///C:/proj/a%20b`).
pub fn to_file_uri(path: &CanonicalPath) -> String {
    let raw = path.as_str();
    let encode = |tail: &str| {
        tail.split(is_separator)
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    };
    if let Some(unc) = raw.strip_prefix(r"\\").or_else(|| raw.strip_prefix("//")) {
        return format!("file://{}", encode(unc));
    }
    match raw.strip_prefix(is_separator) {
        Some(rooted) => format!("file:///{}", encode(rooted)),
        None => format!("file:///{}", encode(raw)),
    }
}
