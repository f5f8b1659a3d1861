//! Recently opened workspaces from an Electron editor's `storage.json`.
//!
//! The file is read as an untyped [`Value`]: only a handful of keys matter
//! and their shape varies between editor versions, so anything missing or
//! mistyped is skipped rather than failing the whole document.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde_json::Value;
use std::path::Path;

/// Raw workspace references in `path`, in document order.
pub(crate) fn read(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).or_raise(|| ErrorKind::Unavailable(path.to_path_buf()))?;
    let document: Value = serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Malformed(path.to_path_buf()))?;
    Ok(recents(&document))
}

/// Workspace references in a parsed `storage.json`:
///
/// - `backupWorkspaces.folders[].folderUri`
/// - `backupWorkspaces.workspaces[].configURIPath`
/// - `openedPathsList.entries[]`, each with a `folderUri`, a `fileUri` or a
///   `workspace.configPath`
/// - the keys of `profileAssociations.workspaces`
pub fn recents(document: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect(&document["backupWorkspaces"]["folders"], &["/folderUri"], &mut found);
    collect(&document["backupWorkspaces"]["workspaces"], &["/configURIPath"], &mut found);
    collect(&document["openedPathsList"]["entries"], &["/folderUri", "/fileUri", "/workspace/configPath"], &mut found);
    if let Some(associations) = document.pointer("/profileAssociations/workspaces").and_then(Value::as_object) {
        found.extend(associations.keys().cloned());
    }
    found
}

/// For every element of the array `items`, the first of `pointers` that
/// resolves to a string.
fn collect(items: &Value, pointers: &[&str], out: &mut Vec<String>) {
    for item in items.as_array().into_iter().flatten() {
        match pointers.iter().find_map(|pointer| item.pointer(pointer).and_then(Value::as_str)) {
            Some(reference) => out.push(reference.to_string()),
            None => tracing::trace!(item = %item, "Skipping entry without a workspace reference"),
        }
    }
}
