//! The canonical path type and lexical normalization of local paths.

use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path};

/// An absolute local path in canonical form.
///
/// - Separators are the platform's native separator.
/// - Drive letters are upper-case.
/// - `.` and `..` segments are resolved (when they don't escape the root).
/// - No trailing separator, except on a bare root.
///
/// Equality and hashing are case-insensitive, so collecting canonical paths
/// into a set collapses `C:\Proj` and `c:\PROJ` into a single entry.
#[derive(Clone, Debug)]
pub struct CanonicalPath {
    path: String,
    key: String,
}
impl CanonicalPath {
    fn new(path: String) -> Self {
        let key = path.to_lowercase();
        Self { path, key }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Case-folded form used for duplicate detection.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Final path segment, used as the display name of a workspace. A bare
    /// root (`C:\`, `/`) is its own name.
    pub fn file_name(&self) -> &str {
        self.path.trim_end_matches(MAIN_SEPARATOR).rsplit(MAIN_SEPARATOR).find(|s| !s.is_empty()).unwrap_or(&self.path)
    }

    /// Whether the path currently exists as a file or directory.
    pub fn exists(&self) -> bool {
        self.as_path().exists()
    }
}
impl PartialEq for CanonicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for CanonicalPath {}
impl Hash for CanonicalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
impl Display for CanonicalPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.path)
    }
}
impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Prefix {
    /// `C:` (always stored upper-case).
    Drive(char),
    /// `\\server\share`
    Unc(String, String),
    /// `/`
    Root,
}

/// Both separators are accepted on every platform: the sources are written by
/// Windows-first tools regardless of where they are read.
pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Produce a canonical path from an already-decoded local path, without
/// touching the filesystem.
///
/// Relative paths (including drive-relative `C:foo`) and empty input are
/// rejected.
pub fn from_local(raw: &str) -> Option<CanonicalPath> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('\0') {
        return None;
    }
    let raw = strip_verbatim(raw);
    let raw = strip_slash_before_drive(&raw);
    let (prefix, rest) = split_prefix(raw)?;
    let segments: Vec<&str> = rest.split(is_separator).filter(|s| !s.is_empty()).collect();
    // Lexical resolution is best-effort: escaping the root keeps the segments as given.
    let segments = resolve_dots(&segments).unwrap_or(segments);
    Some(CanonicalPath::new(join(&prefix, &segments)))
}

/// Windows APIs (and `std::fs::canonicalize`) hand out `\\?\` verbatim paths.
fn strip_verbatim(raw: &str) -> Cow<'_, str> {
    if let Some(unc) = raw.strip_prefix(r"\\?\UNC") {
        return Cow::Owned(format!(r"\{unc}"));
    }
    Cow::Borrowed(raw.strip_prefix(r"\\?\").unwrap_or(raw))
}

/// `/c:/Users` (what a decoded `file:///c:/Users` URI path looks like) loses its
/// leading separator.
fn strip_slash_before_drive(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(sep), Some(letter), Some(':')) if is_separator(sep) && letter.is_ascii_alphabetic() => &raw[1..],
        _ => raw,
    }
}

fn split_prefix(raw: &str) -> Option<(Prefix, &str)> {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let letter = char::from(bytes[0]).to_ascii_uppercase();
        let rest = &raw[2..];
        return match rest.chars().next() {
            None => Some((Prefix::Drive(letter), rest)),
            Some(c) if is_separator(c) => Some((Prefix::Drive(letter), rest)),
            // Drive-relative (`C:foo`) paths depend on per-drive working directories.
            Some(_) => None,
        };
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if is_separator(a) && is_separator(b) => {
            let mut parts = raw[2..].splitn(3, is_separator);
            let server = parts.next().filter(|s| !s.is_empty())?;
            let share = parts.next().filter(|s| !s.is_empty())?;
            let rest = parts.next().unwrap_or("");
            Some((Prefix::Unc(server.to_string(), share.to_string()), rest))
        },
        (Some(a), _) if is_separator(a) => Some((Prefix::Root, &raw[1..])),
        _ => None,
    }
}

/// Returns `None` when a `..` would climb above the root.
fn resolve_dots<'a>(segments: &[&'a str]) -> Option<Vec<&'a str>> {
    let mut resolved = Vec::with_capacity(segments.len());
    for segment in segments {
        match *segment {
            "." => {},
            ".." => {
                resolved.pop()?;
            },
            other => resolved.push(other),
        }
    }
    Some(resolved)
}

fn join(prefix: &Prefix, segments: &[&str]) -> String {
    let tail = segments.join(MAIN_SEPARATOR_STR);
    match prefix {
        Prefix::Drive(letter) => format!("{letter}:{MAIN_SEPARATOR}{tail}"),
        Prefix::Unc(server, share) if tail.is_empty() => {
            format!("{MAIN_SEPARATOR}{MAIN_SEPARATOR}{server}{MAIN_SEPARATOR}{share}")
        },
        Prefix::Unc(server, share) => {
            format!("{MAIN_SEPARATOR}{MAIN_SEPARATOR}{server}{MAIN_SEPARATOR}{share}{MAIN_SEPARATOR}{tail}")
        },
        Prefix::Root => format!("{MAIN_SEPARATOR}{tail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn native(path: &str) -> String {
        path.replace('/', MAIN_SEPARATOR_STR)
    }

    #[rstest]
    #[case("/c:/Users/x/Project", "C:/Users/x/Project")]
    #[case("c:/Users/x/Project/", "C:/Users/x/Project")]
    #[case("d:", "D:/")]
    #[case("/home/x/./project", "/home/x/project")]
    #[case("/home/x/../y", "/home/y")]
    #[case("//server/share/dir", "//server/share/dir")]
    #[case("//server/share", "//server/share")]
    #[case("/", "/")]
    fn test_from_local(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(from_local(input).unwrap().as_str(), native(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("relative/path")]
    #[case("C:relative")]
    #[case("//server")]
    #[case("a\0b")]
    fn test_from_local_rejects(#[case] input: &str) {
        assert!(from_local(input).is_none());
    }

    #[test]
    fn test_escaping_root_keeps_segments() {
        // Nothing to resolve against, so the dots are kept rather than dropping the candidate.
        assert_eq!(from_local("/../etc").unwrap().as_str(), native("/../etc"));
    }

    #[rstest]
    #[case(r"\\?\C:\proj", "C:/proj")]
    #[case(r"\\?\UNC\server\share\dir", "//server/share/dir")]
    fn test_verbatim_prefix_is_stripped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(from_local(input).unwrap().as_str(), native(expected));
    }

    #[test]
    fn test_backslashes_become_native() {
        assert_eq!(from_local(r"c:\proj\sub\..\b.sln").unwrap().as_str(), native("C:/proj/b.sln"));
    }

    #[test]
    fn test_case_insensitive_equality() {
        let lower = from_local("c:/proj/app").unwrap();
        let upper = from_local("C:/PROJ/App").unwrap();
        assert_eq!(lower, upper);
        assert_ne!(lower.as_str(), upper.as_str());
        let set: std::collections::HashSet<_> = [lower, upper].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    #[case("/home/x/project", "project")]
    #[case("c:/proj/b.sln", "b.sln")]
    #[case("/", "/")]
    fn test_file_name(#[case] input: &str, #[case] expected: &str) {
        let path = from_local(input).unwrap();
        let expected = if expected == "/" { MAIN_SEPARATOR_STR } else { expected };
        assert_eq!(path.file_name(), expected);
    }
}
