use crate::kind::ProviderKind;
use crate::launcher::Launcher;
use revisit_paths::CanonicalPath;
use std::sync::Arc;
use std::time::SystemTime;

/// A recently used workspace, as found by one provider during one pass.
#[derive(Clone, Debug)]
pub struct WorkspaceReference {
    path: CanonicalPath,
    provider: ProviderKind,
    modified: Option<SystemTime>,
    launcher: Arc<Launcher>,
}
impl WorkspaceReference {
    pub(crate) fn new(
        path: CanonicalPath,
        provider: ProviderKind,
        modified: Option<SystemTime>,
        launcher: Arc<Launcher>,
    ) -> Self {
        Self { path, provider, modified, launcher }
    }

    pub fn path(&self) -> &CanonicalPath {
        &self.path
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path.file_name()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn icon(&self) -> &'static str {
        self.provider.icon()
    }

    /// Modification time of the workspace itself; `None` when unreadable.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Open the workspace in the tool that reported it.
    pub fn launch(&self) -> bool {
        self.launcher.launch(self.path.as_path())
    }
}
