use std::path::Path;
use std::time::SystemTime;

/// The observed modification state of a cached resource.
#[derive(Clone, Copy, Debug)]
pub enum Stamp {
    /// Last modification time as reported by the filesystem.
    Modified(SystemTime),
    /// The modification time could not be read (missing file, permission
    /// denied, unsupported platform). Never equal to any stamp, itself
    /// included, so an unreadable resource is rebuilt on every lookup.
    Unknown,
}
impl Stamp {
    /// Read the modification time of `path`, falling back to [`Unknown`](Self::Unknown).
    pub fn probe(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match path.metadata().and_then(|metadata| metadata.modified()) {
            Ok(modified) => Self::Modified(modified),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Modification time unavailable");
                Self::Unknown
            },
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Modified(_))
    }

    /// Freshness comparison. Deliberately not [`PartialEq`]: two unknown
    /// stamps do not describe the same resource state.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Modified(a), Self::Modified(b)) => a == b,
            _ => false,
        }
    }
}
impl From<SystemTime> for Stamp {
    fn from(modified: SystemTime) -> Self {
        Self::Modified(modified)
    }
}
