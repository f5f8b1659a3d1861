//! In-memory registry keys for testing.

use crate::error::{ErrorKind, Result};
use crate::key::{RegistryKey, Value};

/// In-memory registry key for testing.
///
/// Built up with the `with_*` methods; [`broken`](Self::broken) produces a
/// key whose every read fails, to exercise the scanner's skip-on-error paths.
///
/// # Examples
///
/// ```
/// use revisit_hive::{MemoryKey, RegistryKey, Value};
///
/// let root = MemoryKey::new().with_key(
///     r"Software\Microsoft\VisualStudio\17.0_abc123",
///     MemoryKey::new().with_string("LastSolution", r"C:\proj\a.sln"),
/// );
/// let instance = root.open(r"software\microsoft\visualstudio\17.0_ABC123").unwrap();
/// assert_eq!(instance.values().unwrap()[0].1, Value::String(r"C:\proj\a.sln".into()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryKey {
    subkeys: Vec<(String, MemoryKey)>,
    values: Vec<(String, Value)>,
    broken: bool,
}

impl MemoryKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// A key that fails to enumerate subkeys or values.
    pub fn broken() -> Self {
        Self { broken: true, ..Self::default() }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn with_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_value(name, Value::String(value.into()))
    }

    pub fn with_multi_string(self, name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.with_value(name, Value::MultiString(values.into_iter().map(Into::into).collect()))
    }

    /// Attach `key` at the backslash-separated `path`, creating any missing
    /// intermediate keys. An existing key at `path` is replaced.
    pub fn with_key(mut self, path: &str, key: MemoryKey) -> Self {
        let parts: Vec<&str> = path.split('\\').filter(|p| !p.is_empty()).collect();
        self.insert(&parts, key);
        self
    }

    fn insert(&mut self, parts: &[&str], key: MemoryKey) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };
        let index = match self.position(first) {
            Some(index) => index,
            None => {
                self.subkeys.push((first.to_string(), MemoryKey::new()));
                self.subkeys.len() - 1
            },
        };
        match rest.is_empty() {
            true => self.subkeys[index].1 = key,
            false => self.subkeys[index].1.insert(rest, key),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.subkeys.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl RegistryKey for MemoryKey {
    fn subkey_names(&self) -> Result<Vec<String>> {
        if self.broken {
            exn::bail!(ErrorKind::Enumerate);
        }
        Ok(self.subkeys.iter().map(|(name, _)| name.clone()).collect())
    }

    fn open(&self, path: &str) -> Result<Self> {
        let mut current = self;
        for part in path.split('\\').filter(|p| !p.is_empty()) {
            match current.position(part) {
                Some(index) => current = &current.subkeys[index].1,
                None => exn::bail!(ErrorKind::Open(path.to_string())),
            }
        }
        Ok(current.clone())
    }

    fn values(&self) -> Result<Vec<(String, Value)>> {
        if self.broken {
            exn::bail!(ErrorKind::Enumerate);
        }
        Ok(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_key_creates_intermediates() {
        let root = MemoryKey::new().with_key(r"A\B\C", MemoryKey::new().with_string("v", "x"));
        assert_eq!(root.subkey_names().unwrap(), vec!["A".to_string()]);
        let c = root.open(r"a\b\c").unwrap();
        assert_eq!(c.values().unwrap(), vec![("v".to_string(), Value::String("x".into()))]);
    }

    #[test]
    fn test_open_missing() {
        let root = MemoryKey::new().with_key("A", MemoryKey::new());
        let err = root.open(r"A\Missing").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Open(path) if path == r"A\Missing"));
    }

    #[test]
    fn test_broken() {
        let key = MemoryKey::broken();
        assert!(key.subkey_names().is_err());
        assert!(key.values().is_err());
    }
}
