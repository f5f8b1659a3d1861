use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// Opens a workspace in its tool.
///
/// Candidates are tried in order until one starts: each executable name on
/// the search path, then the well-known install locations, then any extra
/// locations from configuration.
#[derive(Clone, Debug, Default)]
pub struct Launcher {
    executables: Vec<String>,
    locations: Vec<PathBuf>,
}
impl Launcher {
    pub fn new(executables: impl IntoIterator<Item = impl Into<String>>, locations: Vec<PathBuf>) -> Self {
        Self { executables: executables.into_iter().map(Into::into).collect(), locations }
    }

    /// Append locations tried after every built-in one.
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = PathBuf>) -> Self {
        self.locations.extend(extra);
        self
    }

    /// Every executable that exists right now, in the order they'd be tried.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for name in &self.executables {
            match which::which(name) {
                Ok(path) => candidates.push(path),
                Err(_) => tracing::trace!(executable = %name, "Not found on the search path"),
            }
        }
        candidates.extend(self.locations.iter().filter(|path| path.is_file()).cloned());
        candidates
    }

    /// The executable [`launch`](Self::launch) would try first.
    pub fn resolve(&self) -> Option<PathBuf> {
        self.candidates().into_iter().next()
    }

    /// Start the tool on `path`. Returns whether any candidate started;
    /// failures are logged, never raised.
    pub fn launch(&self, path: &Path) -> bool {
        for executable in self.candidates() {
            match spawn(&executable, path) {
                Ok(()) => {
                    tracing::info!(executable = %executable.display(), path = %path.display(), "Launched workspace");
                    return true;
                },
                Err(err) => {
                    tracing::debug!(error = ?err, retryable = err.is_retryable(), "Launch attempt failed; trying next candidate");
                },
            }
        }
        tracing::warn!(path = %path.display(), "No launcher could open workspace");
        false
    }
}

/// Start `executable` on `path` without waiting for it to exit.
fn spawn(executable: &Path, path: &Path) -> Result<()> {
    let child = Command::new(executable)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .or_raise(|| ErrorKind::Launch(executable.to_path_buf()))?;
    // The tool is already running, so a missing reaper is not a failed launch.
    if let Err(err) = reap(child) {
        tracing::warn!(executable = %executable.display(), error = %err, "Unable to watch launched tool");
    }
    Ok(())
}

/// Wait for `child` on a detached thread so it never lingers as a zombie.
fn reap(mut child: Child) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    std::thread::Builder::new().name("revisit-reaper".to_string()).spawn(move || match child.wait() {
        Ok(status) => {
            tracing::debug!(pid = child.id(), %status, "Launched tool exited");
            Some(status)
        },
        Err(err) => {
            tracing::debug!(pid = child.id(), error = %err, "Unable to wait for launched tool");
            None
        },
    })
}
