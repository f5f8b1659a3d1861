//! Rendering of discovered workspaces for the terminal and for scripts.

use revisit_discover::WorkspaceReference;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One rendered workspace; also the shape of each `list --json` item.
#[derive(Debug, Serialize)]
pub struct Entry<'a> {
    pub path: &'a str,
    pub name: &'a str,
    pub provider: &'static str,
    pub icon: &'static str,
    /// Seconds since the UNIX epoch, `null` when unknown.
    pub modified: Option<u64>,
}
impl<'a> From<&'a WorkspaceReference> for Entry<'a> {
    fn from(reference: &'a WorkspaceReference) -> Self {
        Self {
            path: reference.path().as_str(),
            name: reference.name(),
            provider: reference.provider().id(),
            icon: reference.icon(),
            modified: unix_seconds(reference.modified()),
        }
    }
}

/// Times before the epoch are treated as unknown.
fn unix_seconds(time: Option<SystemTime>) -> Option<u64> {
    time.and_then(|time| time.duration_since(UNIX_EPOCH).ok()).map(|elapsed| elapsed.as_secs())
}

pub fn json(entries: &[Entry<'_>]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

/// Aligned `name  provider  path` rows.
pub fn table(entries: &[Entry<'_>]) -> String {
    let name_width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
    let provider_width = entries.iter().map(|e| e.provider.len()).max().unwrap_or(0);
    entries.iter().map(|e| format!("{:name_width$}  {:provider_width$}  {}\n", e.name, e.provider, e.path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entries() -> Vec<Entry<'static>> {
        vec![
            Entry {
                path: "/home/me/src/app.code-workspace",
                name: "app.code-workspace",
                provider: "vscode",
                icon: "icons/vscode.png",
                modified: Some(1_700_000_000),
            },
            Entry { path: "/srv/Api.sln", name: "Api.sln", provider: "visual-studio", icon: "icons/visual-studio.png", modified: None },
        ]
    }

    #[test]
    fn test_empty() {
        assert_eq!(table(&[]), "");
        assert_eq!(json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_table_columns_are_aligned() {
        let expected = concat!(
            "app.code-workspace  vscode         /home/me/src/app.code-workspace\n",
            "Api.sln             visual-studio  /srv/Api.sln\n",
        );
        assert_eq!(table(&entries()), expected);
    }

    #[test]
    fn test_json_fields() {
        let value: serde_json::Value = serde_json::from_str(&json(&entries()).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {
                    "path": "/home/me/src/app.code-workspace",
                    "name": "app.code-workspace",
                    "provider": "vscode",
                    "icon": "icons/vscode.png",
                    "modified": 1_700_000_000,
                },
                {
                    "path": "/srv/Api.sln",
                    "name": "Api.sln",
                    "provider": "visual-studio",
                    "icon": "icons/visual-studio.png",
                    "modified": null,
                },
            ])
        );
    }

    #[test]
    fn test_unix_seconds() {
        assert_eq!(unix_seconds(Some(UNIX_EPOCH + Duration::from_millis(90_500))), Some(90));
        assert_eq!(unix_seconds(None), None);
        assert_eq!(unix_seconds(Some(UNIX_EPOCH - Duration::from_secs(1))), None);
    }
}
