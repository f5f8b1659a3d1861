//! Pattern extraction of path-like strings from unstructured text.
//!
//! Registry values and settings files embed paths inside JSON blobs,
//! delimited lists and XML, none of it with a stable schema. Instead of
//! parsing, two extractors look for where a candidate *starts* (a
//! `file:///X:/` URI, or an `X:\` drive path) and take everything up to a
//! terminator or the next start.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(URI_START, r"(?i)file:///[a-z](?::|%3a)/");
regex!(PATH_START, r"(?i)\b[a-z]:\\");

/// Which extractor produced a candidate; decides how it is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// A `file:///X:/...` URI, still percent-encoded.
    Uri,
    /// A bare `X:\...` path.
    Path,
}

/// An unvalidated string pulled out of a registry value or settings file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawCandidate {
    pub kind: CandidateKind,
    pub text: String,
}

/// The de-duplicated candidates of one scan, in the order first seen.
#[derive(Clone, Debug, Default)]
pub struct HiveScanResult {
    candidates: Vec<RawCandidate>,
    seen: HashSet<RawCandidate>,
}
impl HiveScanResult {
    pub fn push(&mut self, candidate: RawCandidate) {
        if self.seen.insert(candidate.clone()) {
            self.candidates.push(candidate);
        }
    }

    pub fn merge(&mut self, other: HiveScanResult) {
        for candidate in other.candidates {
            self.push(candidate);
        }
    }

    pub fn candidates(&self) -> &[RawCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Run both extractors over `text`.
    pub fn extract_from(&mut self, text: &str) {
        extract(text, &URI_START, CandidateKind::Uri, uri_terminator, self);
        extract(text, &PATH_START, CandidateKind::Path, path_terminator, self);
    }
}
impl IntoIterator for HiveScanResult {
    type Item = RawCandidate;
    type IntoIter = std::vec::IntoIter<RawCandidate>;
    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

// URIs encode spaces, so any whitespace ends one.
fn uri_terminator(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '|' | '\\')
}

// Paths may contain spaces; list separators and characters Windows forbids
// in file names end them.
fn path_terminator(c: char) -> bool {
    c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '|' | '*' | '?' | ';')
}

fn extract(text: &str, start: &Regex, kind: CandidateKind, terminates: fn(char) -> bool, out: &mut HiveScanResult) {
    let starts: Vec<usize> = start.find_iter(text).map(|m| m.start()).collect();
    for (i, &from) in starts.iter().enumerate() {
        let limit = starts.get(i + 1).copied().unwrap_or(text.len());
        let slice = &text[from..limit];
        let end = slice.find(terminates).unwrap_or(slice.len());
        let candidate = slice[..end].trim_end();
        if !candidate.is_empty() {
            out.push(RawCandidate { kind, text: candidate.to_string() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn extracted(text: &str) -> Vec<(CandidateKind, String)> {
        let mut result = HiveScanResult::default();
        result.extract_from(text);
        result.into_iter().map(|c| (c.kind, c.text)).collect()
    }

    #[test]
    fn test_plain_path() {
        assert_eq!(extracted(r"C:\proj\a.sln"), vec![(CandidateKind::Path, r"C:\proj\a.sln".to_string())]);
    }

    #[test]
    fn test_plain_uri() {
        assert_eq!(extracted("file:///D:/proj/b.sln"), vec![(CandidateKind::Uri, "file:///D:/proj/b.sln".to_string())]);
    }

    #[test]
    fn test_encoded_colon_uri() {
        assert_eq!(extracted("file:///d%3A/My%20Proj/b.sln"), vec![(
            CandidateKind::Uri,
            "file:///d%3A/My%20Proj/b.sln".to_string()
        )]);
    }

    #[test]
    fn test_json_blob() {
        let blob = r#"{"LocalProperties":{"FullPath":"C:\\src\\My App\\App.sln","Type":0},"Remote":"file:///E:/other/x.sln"}"#;
        assert_eq!(extracted(blob), vec![
            (CandidateKind::Uri, "file:///E:/other/x.sln".to_string()),
            (CandidateKind::Path, r"C:\\src\\My App\\App.sln".to_string()),
        ]);
    }

    #[test]
    fn test_delimited_list() {
        assert_eq!(extracted(r"C:\a\one.sln;D:\b\two.sln|e:\c\three.slnx"), vec![
            (CandidateKind::Path, r"C:\a\one.sln".to_string()),
            (CandidateKind::Path, r"D:\b\two.sln".to_string()),
            (CandidateKind::Path, r"e:\c\three.slnx".to_string()),
        ]);
    }

    #[test]
    fn test_adjacent_paths_without_separator() {
        // The next start ends the previous candidate even without a terminator.
        assert_eq!(extracted(r"C:\a\one.sln D:\b\two.sln"), vec![
            (CandidateKind::Path, r"C:\a\one.sln".to_string()),
            (CandidateKind::Path, r"D:\b\two.sln".to_string()),
        ]);
    }

    #[test]
    fn test_xml_text() {
        let xml = r#"<value name="LastOpened"><![CDATA[file:///C:/proj/a.sln]]></value>"#;
        assert_eq!(extracted(xml), vec![(CandidateKind::Uri, "file:///C:/proj/a.sln]]".to_string())]);
    }

    #[rstest]
    #[case("")]
    #[case("no paths here")]
    #[case("file:///not-a-drive/x.sln")]
    #[case("C:relative.sln")]
    #[case("https://example.com/C:/x.sln")]
    fn test_nothing_extracted(#[case] text: &str) {
        assert!(extracted(text).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut result = HiveScanResult::default();
        result.extract_from(r"C:\a.sln");
        result.extract_from(r"C:\a.sln");
        assert_eq!(result.len(), 1);
    }
}
