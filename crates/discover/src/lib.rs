//! Recently used workspaces from every supported editor and IDE.
//!
//! Each [`Provider`] reads one tool's private state (an Electron
//! `storage.json`, or a Visual Studio application hive), caches what it
//! extracted against the state file's modification time, and serves the
//! workspaces that still exist, newest first. The [`Aggregator`] runs all of
//! them concurrently and merges their results in priority order.
//!
//! ```no_run
//! # async fn run() {
//! use revisit_discover::Aggregator;
//! use tokio_util::sync::CancellationToken;
//!
//! let aggregator = Aggregator::from_config(&revisit_config::Config::default());
//! for workspace in aggregator.discover(&CancellationToken::new()).await {
//!     println!("{} ({})", workspace.name(), workspace.provider());
//! }
//! # }
//! ```

mod aggregator;
pub mod error;
mod json;
mod kind;
mod launcher;
mod provider;
mod reference;

pub use crate::aggregator::Aggregator;
pub use crate::kind::{ProviderKind, SourceFormat};
pub use crate::launcher::Launcher;
pub use crate::provider::{HIVE_FILE, Provider};
pub use crate::reference::WorkspaceReference;
