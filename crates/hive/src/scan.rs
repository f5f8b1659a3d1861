use crate::error::{ErrorKind, Result};
use crate::extract::{CandidateKind, HiveScanResult, RawCandidate};
use crate::key::{RegistryKey, Value};
use exn::ResultExt;
use regex::Regex;
use revisit_paths::{CanonicalPath, from_file_uri, from_local};
use std::collections::HashSet;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Where to look inside a hive and what counts as a project file.
#[derive(Clone, Debug)]
pub struct ScanRules {
    /// Key holding the per-instance subkeys, relative to the hive root. If
    /// it can't be opened the root itself is searched.
    pub base_key: String,
    /// Subkeys of [`base_key`](Self::base_key) that are tool instances.
    pub instance: Regex,
    /// Sub-paths of an instance visited before the exhaustive walk.
    pub mru_paths: Vec<String>,
    /// Companion settings file next to the hive, scanned as plain text.
    pub settings_file: Option<String>,
    /// Matches a project file; group 1 is the path up to and including the
    /// extension, anything after it (whitespace, a query) is dropped.
    pub project_file: Regex,
}
impl ScanRules {
    /// Visual Studio 2017 and later: `privateregistry.bin` per instance
    /// directory, solutions as `.sln`, `.slnx` or `.slnf`.
    pub fn visual_studio() -> Self {
        Self {
            base_key: r"Software\Microsoft\VisualStudio".to_string(),
            instance: Regex::new(r"^\d+\.\d+_[0-9A-Fa-f]+$").unwrap(),
            mru_paths: [
                r"MRUItems",
                r"ProjectMRUList",
                r"FileMRUList",
                r"ApplicationPrivateSettings\Microsoft\VisualStudio\CodeContainers",
                r"CodeContainers\Offline",
            ]
            .map(String::from)
            .to_vec(),
            settings_file: Some("ApplicationPrivateSettings.xml".to_string()),
            project_file: Self::extensions(&["sln", "slnx", "slnf"]),
        }
    }

    /// Build a [`project_file`](Self::project_file) pattern for the given
    /// extensions (without dots), matched case-insensitively.
    pub fn extensions(extensions: &[&str]) -> Regex {
        let alternatives = extensions.iter().map(|e| regex::escape(e)).collect::<Vec<_>>().join("|");
        // Anything that could continue a file name after the extension
        // (`.sln.bak`, `.slnx`) rules the shorter match out.
        Regex::new(&format!(r"(?i)^(.*?\.(?:{alternatives}))(?:[^\w.\-/\\].*)?$")).unwrap()
    }
}

/// Extracts project-file references from an application registry hive and
/// its companion settings file.
///
/// Nothing here returns an error: a failure to load, open, enumerate or
/// read is logged and that branch contributes no candidates.
#[derive(Clone, Debug)]
pub struct HiveScanner {
    rules: ScanRules,
}
impl HiveScanner {
    pub fn new(rules: ScanRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScanRules {
        &self.rules
    }

    /// Scan the hive at `hive` and the settings file beside it.
    #[instrument(skip(self, hive, cancel), fields(hive = %hive.display()))]
    pub fn scan(&self, hive: &Path, cancel: &CancellationToken) -> HiveScanResult {
        let mut result = HiveScanResult::default();
        match load(hive) {
            Ok(root) => result.merge(self.scan_key(&root, cancel)),
            Err(err) => {
                tracing::debug!(error = ?err, retryable = err.is_retryable(), "Hive unavailable; continuing without it");
            },
        }
        if let Some(settings) = &self.rules.settings_file
            && let Some(dir) = hive.parent()
            && !cancel.is_cancelled()
        {
            match self.scan_text_file(&dir.join(settings)) {
                Ok(found) => result.merge(found),
                Err(err) => tracing::debug!(error = ?err, retryable = err.is_retryable(), "Settings file unavailable"),
            }
        }
        tracing::debug!(candidates = result.len(), "Hive scan complete");
        result
    }

    /// Walk an opened registry tree.
    ///
    /// Every matching instance is visited MRU paths first, then in full.
    /// Candidates found twice are only reported once.
    pub fn scan_key<K: RegistryKey>(&self, root: &K, cancel: &CancellationToken) -> HiveScanResult {
        let mut result = HiveScanResult::default();
        let base = root.open(&self.rules.base_key);
        if let Err(err) = &base {
            tracing::trace!(error = ?err, "Base key missing; searching from the hive root");
        }
        let base = base.as_ref().unwrap_or(root);
        let names = match base.subkey_names() {
            Ok(names) => names,
            Err(err) => {
                tracing::debug!(error = ?err, "Unable to list instances");
                return result;
            },
        };
        for name in names.iter().filter(|name| self.rules.instance.is_match(name)) {
            if cancel.is_cancelled() {
                tracing::debug!("Hive scan cancelled");
                break;
            }
            let instance = match base.open(name) {
                Ok(instance) => instance,
                Err(err) => {
                    tracing::debug!(instance = %name, error = ?err, "Skipping unreadable instance");
                    continue;
                },
            };
            for mru in &self.rules.mru_paths {
                if let Ok(key) = instance.open(mru) {
                    self.walk(&key, cancel, &mut result);
                }
            }
            self.walk(&instance, cancel, &mut result);
        }
        result
    }

    /// Scan text (a settings file, a log) with the same extractors.
    pub fn scan_text(&self, text: &str) -> HiveScanResult {
        let mut result = HiveScanResult::default();
        result.extract_from(text);
        result
    }

    pub fn scan_text_file(&self, path: &Path) -> Result<HiveScanResult> {
        let bytes = std::fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        Ok(self.scan_text(&String::from_utf8_lossy(&bytes)))
    }

    /// Turn raw candidates into project files that exist right now.
    ///
    /// Order is preserved and duplicates (case-insensitive) are dropped.
    pub fn resolve(&self, candidates: impl IntoIterator<Item = RawCandidate>) -> Vec<CanonicalPath> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter_map(|candidate| self.resolve_one(&candidate))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    fn resolve_one(&self, candidate: &RawCandidate) -> Option<CanonicalPath> {
        let path = self.project_path(candidate)?;
        if !path.exists() {
            tracing::trace!(path = %path, "Skipping project file that no longer exists");
            return None;
        }
        Some(path)
    }

    /// Decode a candidate and cut it down to its project file, without
    /// checking the filesystem.
    pub fn project_path(&self, candidate: &RawCandidate) -> Option<CanonicalPath> {
        let text = candidate.text.trim().trim_matches(|c| c == '"' || c == '\'');
        let local = match candidate.kind {
            CandidateKind::Uri => from_file_uri(text)?,
            CandidateKind::Path => from_local(text)?,
        };
        let captures = self.rules.project_file.captures(local.as_str())?;
        from_local(captures.get(1)?.as_str())
    }

    /// Depth-first over `top` and everything beneath it, holding one opened
    /// key at a time. A key that fails to open or enumerate is skipped along
    /// with its subtree.
    fn walk<K: RegistryKey>(&self, top: &K, cancel: &CancellationToken, out: &mut HiveScanResult) {
        let mut stack = vec![String::new()];
        while let Some(relative) = stack.pop() {
            if cancel.is_cancelled() {
                return;
            }
            let opened;
            let key = match relative.is_empty() {
                true => top,
                false => match top.open(&relative) {
                    Ok(key) => {
                        opened = key;
                        &opened
                    },
                    Err(err) => {
                        tracing::trace!(error = ?err, "Skipping unopenable key");
                        continue;
                    },
                },
            };
            match key.values() {
                Ok(values) => values.iter().for_each(|(_, value)| extract_value(value, out)),
                Err(err) => tracing::trace!(key = %relative, error = ?err, "Skipping unreadable values"),
            }
            match key.subkey_names() {
                Ok(names) => stack.extend(names.iter().rev().map(|name| match relative.is_empty() {
                    true => name.clone(),
                    false => format!("{relative}\\{name}"),
                })),
                Err(err) => tracing::trace!(key = %relative, error = ?err, "Skipping unlistable subkeys"),
            }
        }
    }
}
impl Default for HiveScanner {
    fn default() -> Self {
        Self::new(ScanRules::visual_studio())
    }
}

fn extract_value(value: &Value, out: &mut HiveScanResult) {
    match value {
        Value::String(text) => out.extract_from(text),
        Value::MultiString(texts) => texts.iter().for_each(|text| out.extract_from(text)),
        Value::Other => {},
    }
}

#[cfg(windows)]
fn load(hive: &Path) -> Result<crate::HiveKey> {
    crate::HiveKey::load(hive)
}

/// Application hives are a Win32 facility; elsewhere there is never one to load.
#[cfg(not(windows))]
enum NoHive {}

#[cfg(not(windows))]
impl RegistryKey for NoHive {
    fn subkey_names(&self) -> Result<Vec<String>> {
        match *self {}
    }

    fn open(&self, _path: &str) -> Result<Self> {
        match *self {}
    }

    fn values(&self) -> Result<Vec<(String, Value)>> {
        match *self {}
    }
}

#[cfg(not(windows))]
fn load(hive: &Path) -> Result<NoHive> {
    exn::bail!(ErrorKind::Load { path: hive.to_path_buf(), status: 0 })
}
