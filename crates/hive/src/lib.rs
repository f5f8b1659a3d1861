//! Project references from private application registry hives.
//!
//! Visual Studio keeps its MRU lists in a per-instance `privateregistry.bin`
//! rather than the live registry. On Windows the file is loaded read-only as
//! an application hive and walked in full; on every platform the
//! `ApplicationPrivateSettings.xml` written beside it is scanned as text.
//! Values have no reliable schema, so candidates are pulled out by pattern
//! (see [`HiveScanResult::extract_from`]) and validated afterwards
//! ([`HiveScanner::resolve`]).

pub mod error;
mod extract;
mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod scan;
#[cfg(windows)]
mod windows;

pub use crate::extract::{CandidateKind, HiveScanResult, RawCandidate};
pub use crate::key::{RegistryKey, Value};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MemoryKey;
pub use crate::scan::{HiveScanner, ScanRules};
#[cfg(windows)]
pub use crate::windows::HiveKey;
#[cfg(all(windows, any(test, feature = "mock")))]
pub use crate::windows::write_hive;
