//! Application hives loaded through the Win32 registry API.

use crate::error::{ErrorKind, Result};
use crate::key::{RegistryKey, Value};
use std::ffi::OsStr;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr::{null, null_mut};
use windows_sys::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
use windows_sys::Win32::System::Registry::{
    HKEY, KEY_READ, REG_EXPAND_SZ, REG_MULTI_SZ, REG_SZ, RegCloseKey, RegEnumKeyExW, RegEnumValueW, RegLoadAppKeyW,
    RegOpenKeyExW, RegQueryInfoKeyW,
};

/// An open key inside an application hive.
///
/// The hive itself stays loaded for as long as any of its keys are open;
/// dropping the last one (normally the root returned by [`load`](Self::load))
/// unloads it.
pub struct HiveKey {
    handle: HKEY,
    /// Relative path from the hive root, for diagnostics.
    path: String,
}

#[derive(Default)]
struct KeyInfo {
    subkeys: u32,
    max_subkey_len: u32,
    values: u32,
    max_value_name_len: u32,
    max_value_len: u32,
}

fn wide(s: impl AsRef<OsStr>) -> Vec<u16> {
    s.as_ref().encode_wide().chain(once(0)).collect()
}

impl HiveKey {
    /// Load `file` as a private, read-only registry root. No elevation is
    /// needed and nothing is mounted into the live registry.
    pub fn load(file: &Path) -> Result<Self> {
        // A missing file would otherwise be created as a new, empty hive.
        if !file.is_file() {
            exn::bail!(ErrorKind::Load { path: file.to_path_buf(), status: ERROR_FILE_NOT_FOUND });
        }
        let name = wide(file);
        let mut handle: HKEY = null_mut();
        // SAFETY: `name` is NUL-terminated and outlives the call, `handle` is
        // a valid out-pointer.
        let status = unsafe { RegLoadAppKeyW(name.as_ptr(), &mut handle, KEY_READ, 0, 0) };
        if status != ERROR_SUCCESS || handle.is_null() {
            exn::bail!(ErrorKind::Load { path: file.to_path_buf(), status });
        }
        tracing::debug!(hive = %file.display(), "Application hive loaded");
        Ok(Self { handle, path: String::new() })
    }

    fn info(&self) -> Result<KeyInfo> {
        let mut info = KeyInfo::default();
        // SAFETY: every out-pointer references a live local; unused outputs are null.
        let status = unsafe {
            RegQueryInfoKeyW(
                self.handle,
                null_mut(),
                null_mut(),
                null(),
                &mut info.subkeys,
                &mut info.max_subkey_len,
                null_mut(),
                &mut info.values,
                &mut info.max_value_name_len,
                &mut info.max_value_len,
                null_mut(),
                null_mut(),
            )
        };
        if status != ERROR_SUCCESS {
            exn::bail!(ErrorKind::Enumerate);
        }
        Ok(info)
    }
}

impl RegistryKey for HiveKey {
    fn subkey_names(&self) -> Result<Vec<String>> {
        let info = self.info()?;
        let mut names = Vec::with_capacity(info.subkeys as usize);
        let mut buffer = vec![0u16; info.max_subkey_len as usize + 1];
        for index in 0..info.subkeys {
            let mut len = buffer.len() as u32;
            // SAFETY: `len` holds the buffer capacity in characters.
            let status = unsafe {
                RegEnumKeyExW(self.handle, index, buffer.as_mut_ptr(), &mut len, null(), null_mut(), null_mut(), null_mut())
            };
            match status {
                ERROR_SUCCESS => names.push(String::from_utf16_lossy(&buffer[..len as usize])),
                ERROR_NO_MORE_ITEMS => break,
                // The key changed underneath us; skip the entry rather than the key.
                _ => tracing::trace!(key = %self.path, index, status, "Skipping unreadable subkey name"),
            }
        }
        Ok(names)
    }

    fn open(&self, path: &str) -> Result<Self> {
        let name = wide(path);
        let mut handle: HKEY = null_mut();
        // SAFETY: `name` is NUL-terminated and outlives the call, `handle` is
        // a valid out-pointer.
        let status = unsafe { RegOpenKeyExW(self.handle, name.as_ptr(), 0, KEY_READ, &mut handle) };
        let path = match self.path.is_empty() {
            true => path.to_string(),
            false => format!("{}\\{}", self.path, path),
        };
        if status != ERROR_SUCCESS || handle.is_null() {
            exn::bail!(ErrorKind::Open(path));
        }
        Ok(Self { handle, path })
    }

    fn values(&self) -> Result<Vec<(String, Value)>> {
        let info = self.info()?;
        let mut values = Vec::with_capacity(info.values as usize);
        let mut name = vec![0u16; info.max_value_name_len as usize + 1];
        // Room for a missing terminator on strings that were stored without one.
        let mut data = vec![0u8; info.max_value_len as usize + 2];
        for index in 0..info.values {
            let mut name_len = name.len() as u32;
            let mut data_len = data.len() as u32;
            let mut kind = 0u32;
            // SAFETY: lengths hold the capacities of their buffers.
            let status = unsafe {
                RegEnumValueW(
                    self.handle,
                    index,
                    name.as_mut_ptr(),
                    &mut name_len,
                    null(),
                    &mut kind,
                    data.as_mut_ptr(),
                    &mut data_len,
                )
            };
            match status {
                ERROR_SUCCESS => {},
                ERROR_NO_MORE_ITEMS => break,
                // Includes ERROR_MORE_DATA: the value grew after we sized the buffer.
                _ => {
                    tracing::trace!(key = %self.path, index, status, "Skipping unreadable value");
                    continue;
                },
            }
            let value_name = String::from_utf16_lossy(&name[..name_len as usize]);
            let value = decode(kind, &data[..data_len as usize]);
            values.push((value_name, value));
        }
        Ok(values)
    }
}

impl Drop for HiveKey {
    fn drop(&mut self) {
        // SAFETY: the handle was opened by this value and is closed exactly once.
        unsafe {
            RegCloseKey(self.handle);
        }
    }
}

/// Write the tree under `root` into a new hive file at `file`.
#[cfg(any(test, feature = "mock"))]
pub fn write_hive<K: RegistryKey>(file: &Path, root: &K) -> Result<()> {
    use windows_sys::Win32::System::Registry::KEY_ALL_ACCESS;

    let name = wide(file);
    let mut handle: HKEY = null_mut();
    // SAFETY: as in `HiveKey::load`. A missing file is created as an empty hive.
    let status = unsafe { RegLoadAppKeyW(name.as_ptr(), &mut handle, KEY_ALL_ACCESS, 0, 0) };
    if status != ERROR_SUCCESS || handle.is_null() {
        exn::bail!(ErrorKind::Load { path: file.to_path_buf(), status });
    }
    let hive = HiveKey { handle, path: String::new() };
    copy_into(&hive, root)
}

#[cfg(any(test, feature = "mock"))]
fn copy_into<K: RegistryKey>(target: &HiveKey, source: &K) -> Result<()> {
    use windows_sys::Win32::System::Registry::{KEY_ALL_ACCESS, REG_OPTION_NON_VOLATILE, RegCreateKeyExW, RegSetValueExW};

    for (name, value) in source.values()? {
        let (kind, data) = match value {
            Value::String(s) => (REG_SZ, wide(s)),
            Value::MultiString(items) => {
                let mut data: Vec<u16> = items.iter().flat_map(|item| wide(item)).collect();
                data.push(0);
                (REG_MULTI_SZ, data)
            },
            Value::Other => continue,
        };
        let name = wide(&name);
        // SAFETY: `data` is a live buffer of exactly the byte length passed.
        let status = unsafe {
            RegSetValueExW(target.handle, name.as_ptr(), 0, kind, data.as_ptr().cast(), (data.len() * 2) as u32)
        };
        if status != ERROR_SUCCESS {
            exn::bail!(ErrorKind::Enumerate);
        }
    }
    for name in source.subkey_names()? {
        let child = source.open(&name)?;
        let wide_name = wide(&name);
        let mut handle: HKEY = null_mut();
        // SAFETY: `wide_name` is NUL-terminated, `handle` is a valid out-pointer.
        let status = unsafe {
            RegCreateKeyExW(
                target.handle,
                wide_name.as_ptr(),
                0,
                null(),
                REG_OPTION_NON_VOLATILE,
                KEY_ALL_ACCESS,
                null(),
                &mut handle,
                null_mut(),
            )
        };
        if status != ERROR_SUCCESS || handle.is_null() {
            exn::bail!(ErrorKind::Open(name));
        }
        copy_into(&HiveKey { handle, path: name }, &child)?;
    }
    Ok(())
}

fn utf16(bytes: &[u8]) -> Vec<u16> {
    bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect()
}

fn decode(kind: u32, bytes: &[u8]) -> Value {
    match kind {
        REG_SZ | REG_EXPAND_SZ => {
            let units = utf16(bytes);
            let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
            Value::String(String::from_utf16_lossy(&units[..end]))
        },
        REG_MULTI_SZ => Value::MultiString(
            utf16(bytes)
                .split(|&u| u == 0)
                .filter(|s| !s.is_empty())
                .map(String::from_utf16_lossy)
                .collect(),
        ),
        _ => Value::Other,
    }
}
