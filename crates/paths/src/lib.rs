//! Canonical local paths for workspace references.
//!
//! Editors persist the same location in several shapes: `file:` URIs (with or
//! without a percent-encoded drive colon), URI-decoded paths with a leading
//! separator before the drive (`/c:/Users/...`), and plain paths in whatever
//! separator convention the tool prefers. Everything funnels through
//! [`normalize`] into a [`CanonicalPath`], which compares case-insensitively
//! so references to one location collapse into one entry.
//!
//! Remote and virtual workspaces (`vscode-remote://`, `vscode-vfs://`, ...)
//! are recognized and discarded.

mod canonical;
mod uri;

pub use crate::canonical::{CanonicalPath, from_local};
pub use crate::uri::{from_file_uri, to_file_uri};

/// Normalize a raw workspace reference into a canonical local path.
///
/// - `file:` URIs are decoded and converted; the target does not need to exist.
/// - Any other URI scheme yields `None`.
/// - Plain paths are accepted only if they exist as a file or directory.
///
/// A `None` means "skip this candidate"; it is never an error condition.
///
/// # Examples
///
/// ```
/// use std::path::MAIN_SEPARATOR;
/// let path = revisit_paths::normalize("file:///c:/Users/x/Project").unwrap();
/// assert_eq!(path.as_str(), format!("C:{0}Users{0}x{0}Project", MAIN_SEPARATOR));
///
/// assert!(revisit_paths::normalize("vscode-remote://wsl+ubuntu/home/x").is_none());
/// ```
pub fn normalize(raw: &str) -> Option<CanonicalPath> {
    let raw = raw.trim();
    match scheme(raw) {
        Some(scheme) if scheme.eq_ignore_ascii_case("file") => from_file_uri(raw),
        Some(scheme) => {
            tracing::trace!(scheme, "Discarding non-local workspace reference");
            None
        },
        None => from_local(raw).filter(CanonicalPath::exists),
    }
}

/// The URI scheme of `raw`, if it has one.
///
/// Single letters are drive letters, not schemes: `C:\proj` has no scheme.
fn scheme(raw: &str) -> Option<&str> {
    let (candidate, _) = raw.split_once(':')?;
    let mut chars = candidate.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (valid && candidate.len() > 1).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::MAIN_SEPARATOR;

    #[rstest]
    #[case("file:///c:/x", Some("file"))]
    #[case("vscode-remote://wsl+ubuntu/home/x", Some("vscode-remote"))]
    #[case("vscode-vfs://github/org/repo", Some("vscode-vfs"))]
    #[case(r"C:\proj", None)]
    #[case("/home/x", None)]
    #[case("/home/x:y", None)]
    fn test_scheme(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(scheme(input), expected);
    }

    #[test]
    fn test_drive_letter_casing() {
        let path = normalize("file:///c:/Users/x/Project").unwrap();
        assert_eq!(path.as_str(), format!("C:{0}Users{0}x{0}Project", MAIN_SEPARATOR));
        assert!(path.as_str().starts_with('C'));
    }

    #[rstest]
    #[case("vscode-remote://wsl+ubuntu/home/x")]
    #[case("vscode-remote://ssh-remote+host/srv/app")]
    #[case("vscode-vfs://github/org/repo")]
    fn test_remote_rejection(#[case] input: &str) {
        assert!(normalize(input).is_none());
    }

    #[test]
    fn test_bare_path_requires_existence() {
        let temp = tempfile::tempdir().unwrap();
        let existing = temp.path().to_str().unwrap();
        assert!(normalize(existing).is_some());
        let missing = temp.path().join("missing");
        assert!(normalize(missing.to_str().unwrap()).is_none());
    }

    #[test]
    fn test_malformed_uri() {
        assert!(normalize("file://[broken/").is_none());
    }

    #[test]
    fn test_idempotence() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("Some Project");
        std::fs::create_dir(&dir).unwrap();
        let once = normalize(dir.to_str().unwrap()).unwrap();
        let twice = normalize(once.as_str()).unwrap();
        assert_eq!(once.as_str(), twice.as_str());
    }

    #[test]
    fn test_uri_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("b 100%.sln");
        std::fs::write(&file, b"").unwrap();
        let canonical = normalize(file.to_str().unwrap()).unwrap();
        let uri = to_file_uri(&canonical);
        assert_eq!(normalize(&uri).unwrap().as_str(), canonical.as_str());
    }
}
