use crate::error::Result;

/// Registry value data, reduced to the shapes that can carry paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `REG_SZ` or `REG_EXPAND_SZ` (unexpanded).
    String(String),
    /// `REG_MULTI_SZ`, one entry per string.
    MultiString(Vec<String>),
    /// Any other type; never inspected.
    Other,
}

/// An opened registry key that can be walked.
///
/// Implemented by the Windows application hive ([`HiveKey`](crate::HiveKey))
/// and, with the `mock` feature, by the in-memory
/// [`MemoryKey`](crate::MemoryKey). Handles are released when the value is
/// dropped.
pub trait RegistryKey: Sized {
    /// Names of the immediate subkeys, in enumeration order.
    fn subkey_names(&self) -> Result<Vec<String>>;

    /// Open a descendant by backslash-separated relative path
    /// (`MRUItems\{guid}\Items`). Names are case-insensitive.
    fn open(&self, path: &str) -> Result<Self>;

    /// Every value of this key, in enumeration order.
    fn values(&self) -> Result<Vec<(String, Value)>>;
}
