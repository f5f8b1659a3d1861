use directories::BaseDirs;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Every tool workspaces can be discovered from, in priority order.
///
/// Adding a tool means adding a variant here and an entry to [`ALL`](Self::ALL).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    VsCode,
    VsCodeInsiders,
    VsCodium,
    Cursor,
    Windsurf,
    VisualStudio,
}

/// How a tool persists its recently used workspaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// A `storage.json` under the editor's user data directory.
    JsonRecents,
    /// Per-instance `privateregistry.bin` hives.
    RegistryHive,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        Self::VsCode,
        Self::VsCodeInsiders,
        Self::VsCodium,
        Self::Cursor,
        Self::Windsurf,
        Self::VisualStudio,
    ];

    /// Stable identifier, used as the configuration key.
    pub fn id(self) -> &'static str {
        match self {
            Self::VsCode => "vscode",
            Self::VsCodeInsiders => "vscode-insiders",
            Self::VsCodium => "vscodium",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
            Self::VisualStudio => "visual-studio",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id().eq_ignore_ascii_case(id))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::VsCode => "Visual Studio Code",
            Self::VsCodeInsiders => "Visual Studio Code - Insiders",
            Self::VsCodium => "VSCodium",
            Self::Cursor => "Cursor",
            Self::Windsurf => "Windsurf",
            Self::VisualStudio => "Visual Studio",
        }
    }

    /// Icon token handed to whatever renders the results.
    pub fn icon(self) -> &'static str {
        match self {
            Self::VsCode => "icons/vscode.png",
            Self::VsCodeInsiders => "icons/vscode-insiders.png",
            Self::VsCodium => "icons/vscodium.png",
            Self::Cursor => "icons/cursor.png",
            Self::Windsurf => "icons/windsurf.png",
            Self::VisualStudio => "icons/visual-studio.png",
        }
    }

    pub fn format(self) -> SourceFormat {
        match self {
            Self::VisualStudio => SourceFormat::RegistryHive,
            _ => SourceFormat::JsonRecents,
        }
    }

    /// The tool's data directory on this platform: the Electron user data
    /// directory for editors, the directory of instance folders for Visual
    /// Studio.
    pub fn default_data_dir(self) -> Option<PathBuf> {
        let dirs = BaseDirs::new()?;
        Some(match self {
            Self::VsCode => dirs.config_dir().join("Code"),
            Self::VsCodeInsiders => dirs.config_dir().join("Code - Insiders"),
            Self::VsCodium => dirs.config_dir().join("VSCodium"),
            Self::Cursor => dirs.config_dir().join("Cursor"),
            Self::Windsurf => dirs.config_dir().join("Windsurf"),
            Self::VisualStudio => dirs.data_local_dir().join("Microsoft").join("VisualStudio"),
        })
    }

    /// Executable names looked up on the search path.
    pub fn executables(self) -> &'static [&'static str] {
        match self {
            Self::VsCode => &["code"],
            Self::VsCodeInsiders => &["code-insiders"],
            Self::VsCodium => &["codium"],
            Self::Cursor => &["cursor"],
            Self::Windsurf => &["windsurf"],
            Self::VisualStudio => &["devenv"],
        }
    }

    /// Well-known install locations, tried after the search path.
    pub fn install_locations(self) -> Vec<PathBuf> {
        install_locations(self)
    }
}
impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.id())
    }
}

#[cfg(windows)]
fn install_locations(kind: ProviderKind) -> Vec<PathBuf> {
    let local = BaseDirs::new().map(|dirs| dirs.data_local_dir().join("Programs"));
    let program_files: Vec<PathBuf> = ["ProgramFiles", "ProgramFiles(x86)"]
        .into_iter()
        .filter_map(std::env::var_os)
        .map(PathBuf::from)
        .collect();
    let (folder, exe) = match kind {
        ProviderKind::VsCode => ("Microsoft VS Code", "Code.exe"),
        ProviderKind::VsCodeInsiders => ("Microsoft VS Code Insiders", "Code - Insiders.exe"),
        ProviderKind::VsCodium => ("VSCodium", "VSCodium.exe"),
        ProviderKind::Cursor => ("cursor", "Cursor.exe"),
        ProviderKind::Windsurf => ("Windsurf", "Windsurf.exe"),
        ProviderKind::VisualStudio => {
            let mut found = Vec::new();
            for root in &program_files {
                for edition in ["Enterprise", "Professional", "Community", "Preview"] {
                    found.push(
                        root.join("Microsoft Visual Studio")
                            .join("2022")
                            .join(edition)
                            .join(r"Common7\IDE\devenv.exe"),
                    );
                }
            }
            return found;
        },
    };
    local.into_iter().chain(program_files).map(|root| root.join(folder).join(exe)).collect()
}

#[cfg(target_os = "macos")]
fn install_locations(kind: ProviderKind) -> Vec<PathBuf> {
    let bundle = match kind {
        ProviderKind::VsCode => "Visual Studio Code.app/Contents/Resources/app/bin/code",
        ProviderKind::VsCodeInsiders => "Visual Studio Code - Insiders.app/Contents/Resources/app/bin/code-insiders",
        ProviderKind::VsCodium => "VSCodium.app/Contents/Resources/app/bin/codium",
        ProviderKind::Cursor => "Cursor.app/Contents/Resources/app/bin/cursor",
        ProviderKind::Windsurf => "Windsurf.app/Contents/Resources/app/bin/windsurf",
        ProviderKind::VisualStudio => return Vec::new(),
    };
    let mut roots = vec![PathBuf::from("/Applications")];
    if let Some(dirs) = BaseDirs::new() {
        roots.push(dirs.home_dir().join("Applications"));
    }
    roots.into_iter().map(|root| root.join(bundle)).collect()
}

#[cfg(not(any(windows, target_os = "macos")))]
fn install_locations(kind: ProviderKind) -> Vec<PathBuf> {
    let paths: &[&str] = match kind {
        ProviderKind::VsCode => &["/usr/share/code/bin/code", "/snap/bin/code", "/var/lib/flatpak/exports/bin/com.visualstudio.code"],
        ProviderKind::VsCodeInsiders => &["/usr/share/code-insiders/bin/code-insiders", "/snap/bin/code-insiders"],
        ProviderKind::VsCodium => &["/usr/share/codium/bin/codium", "/snap/bin/codium", "/var/lib/flatpak/exports/bin/com.vscodium.codium"],
        ProviderKind::Cursor => &["/usr/share/cursor/bin/cursor", "/opt/cursor/cursor"],
        ProviderKind::Windsurf => &["/usr/share/windsurf/bin/windsurf"],
        ProviderKind::VisualStudio => &[],
    };
    paths.iter().map(PathBuf::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = ProviderKind::ALL.iter().map(|kind| kind.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ProviderKind::ALL.len());
    }

    #[rstest]
    #[case("vscode", Some(ProviderKind::VsCode))]
    #[case("Visual-Studio", Some(ProviderKind::VisualStudio))]
    #[case("vscode-insiders", Some(ProviderKind::VsCodeInsiders))]
    #[case("sublime", None)]
    fn test_from_id(#[case] id: &str, #[case] expected: Option<ProviderKind>) {
        assert_eq!(ProviderKind::from_id(id), expected);
    }

    #[test]
    fn test_only_visual_studio_uses_a_hive() {
        let hives: Vec<_> =
            ProviderKind::ALL.into_iter().filter(|kind| kind.format() == SourceFormat::RegistryHive).collect();
        assert_eq!(hives, vec![ProviderKind::VisualStudio]);
    }
}
