use crate::json;
use crate::kind::{ProviderKind, SourceFormat};
use crate::launcher::Launcher;
use crate::reference::WorkspaceReference;
use revisit_cache::{Stamp, TimestampCache};
use revisit_config::ProviderConfig;
use revisit_hive::HiveScanner;
use revisit_paths::{CanonicalPath, normalize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Name of the hive file inside a Visual Studio instance directory.
pub const HIVE_FILE: &str = "privateregistry.bin";

enum Source {
    JsonRecents,
    RegistryHive(HiveScanner),
    #[cfg(test)]
    Panicking,
}

/// Discovers the recently used workspaces of one tool.
///
/// The extracted candidate list is cached against the modification time of
/// the tool's state file. Existence and ordering are re-evaluated on every
/// call, so a workspace deleted since the last rebuild disappears
/// immediately.
pub struct Provider {
    kind: ProviderKind,
    data_dir: Option<PathBuf>,
    launcher: Arc<Launcher>,
    source: Source,
    cache: TimestampCache<Vec<CanonicalPath>>,
}

impl Provider {
    /// A provider using the tool's default locations.
    pub fn new(kind: ProviderKind) -> Self {
        let source = match kind.format() {
            SourceFormat::JsonRecents => Source::JsonRecents,
            SourceFormat::RegistryHive => Source::RegistryHive(HiveScanner::default()),
        };
        Self {
            kind,
            data_dir: kind.default_data_dir(),
            launcher: Arc::new(Launcher::new(kind.executables().iter().copied(), kind.install_locations())),
            source,
            cache: TimestampCache::new(),
        }
    }

    pub fn from_config(kind: ProviderKind, config: &ProviderConfig) -> Self {
        let mut provider = Self::new(kind);
        if let Some(dir) = &config.data_dir {
            provider.data_dir = Some(dir.clone());
        }
        if !config.launchers.is_empty() {
            let launcher = Launcher::clone(&provider.launcher).with_extra(config.launchers.iter().cloned());
            provider.launcher = Arc::new(launcher);
        }
        provider
    }

    /// A provider whose discovery panics.
    #[cfg(test)]
    pub(crate) fn panicking(kind: ProviderKind) -> Self {
        Self { source: Source::Panicking, ..Self::new(kind) }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = Arc::new(launcher);
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// Open `path` in this provider's tool.
    pub fn launch(&self, path: &Path) -> bool {
        self.launcher.launch(path)
    }

    /// The state file this provider reads right now, if there is one.
    ///
    /// For Visual Studio this is the hive of the most recently used instance.
    pub fn source_path(&self) -> Option<PathBuf> {
        let dir = self.data_dir.as_deref()?;
        match &self.source {
            Source::JsonRecents => {
                let path = dir.join("User").join("globalStorage").join("storage.json");
                path.is_file().then_some(path)
            },
            Source::RegistryHive(scanner) => newest_instance(dir, scanner).map(|(hive, _)| hive),
            #[cfg(test)]
            Source::Panicking => None,
        }
    }

    /// Existing workspaces, most recently modified first.
    ///
    /// Never fails: a missing or unreadable source yields an empty list, as
    /// does cancellation.
    #[instrument(skip_all, fields(provider = %self.kind))]
    pub fn discover(&self, cancel: &CancellationToken) -> Vec<WorkspaceReference> {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        let Some(dir) = self.data_dir.as_deref() else {
            tracing::debug!("No data directory on this platform");
            return Vec::new();
        };

        let mut rebuilt = false;
        let candidates = match &self.source {
            Source::JsonRecents => {
                let path = dir.join("User").join("globalStorage").join("storage.json");
                if !path.exists() {
                    tracing::debug!(source = %path.display(), "Source not found");
                    return Vec::new();
                }
                self.cache.get_or_refresh_path(&path, |path| {
                    rebuilt = true;
                    rebuild_json(path)
                })
            },
            Source::RegistryHive(scanner) => {
                let Some((hive, stamp)) = newest_instance(dir, scanner) else {
                    tracing::debug!(source = %dir.display(), "No instance found");
                    return Vec::new();
                };
                let found = self.cache.get_or_try_refresh(&hive.to_string_lossy(), stamp, |_| {
                    rebuilt = true;
                    let found = scanner.resolve(scanner.scan(&hive, cancel));
                    // A cancelled scan may have stopped part way.
                    (!cancel.is_cancelled()).then_some(found)
                });
                match found {
                    Some(found) => found,
                    None => return Vec::new(),
                }
            },
            #[cfg(test)]
            Source::Panicking => panic!("{} discovery failed", self.kind),
        };

        if cancel.is_cancelled() {
            return Vec::new();
        }
        let references = self.serve(&candidates);
        tracing::debug!(candidates = candidates.len(), workspaces = references.len(), rebuilt, "Discovery complete");
        references
    }

    fn serve(&self, candidates: &[CanonicalPath]) -> Vec<WorkspaceReference> {
        let mut references: Vec<_> = candidates
            .iter()
            .filter_map(|path| {
                // Unreadable metadata means the path is gone or inaccessible.
                let metadata = path.as_path().metadata().ok()?;
                Some(WorkspaceReference::new(
                    path.clone(),
                    self.kind,
                    metadata.modified().ok(),
                    Arc::clone(&self.launcher),
                ))
            })
            .collect();
        // Stable: equal times keep collection order, unknown times sort last.
        references.sort_by_key(|reference| Reverse(reference.modified()));
        references
    }
}

fn rebuild_json(path: &Path) -> Vec<CanonicalPath> {
    let raw = match json::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!(error = ?err, retryable = err.is_retryable(), "Unable to read recents");
            return Vec::new();
        },
    };
    let mut seen = HashSet::new();
    let candidates: Vec<_> = raw.iter().filter_map(|raw| normalize(raw)).filter(|path| seen.insert(path.clone())).collect();
    tracing::info!(source = %path.display(), raw = raw.len(), candidates = candidates.len(), "Rebuilt recents");
    candidates
}

/// The instance directory under `dir` whose hive or settings file changed
/// most recently, as the hive path and the newest of the two timestamps.
fn newest_instance(dir: &Path, scanner: &HiveScanner) -> Option<(PathBuf, Stamp)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "Unable to list instances");
            return None;
        },
    };
    let rules = scanner.rules();
    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !rules.instance.is_match(name) {
            continue;
        }
        let instance = entry.path();
        let files = std::iter::once(instance.join(HIVE_FILE))
            .chain(rules.settings_file.as_ref().map(|settings| instance.join(settings)));
        let modified = files.filter_map(|file| file.metadata().and_then(|m| m.modified()).ok()).max();
        if let Some(modified) = modified
            && newest.as_ref().is_none_or(|(_, best)| modified > *best)
        {
            newest = Some((instance.join(HIVE_FILE), modified));
        }
    }
    newest.map(|(hive, modified)| (hive, Stamp::from(modified)))
}
