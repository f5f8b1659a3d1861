use crate::kind::ProviderKind;
use crate::provider::Provider;
use crate::reference::WorkspaceReference;
use futures::future::join_all;
use revisit_config::Config;
use revisit_paths::normalize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Runs every provider and merges their results.
///
/// Providers are queried concurrently, each on the blocking pool, and the
/// pass completes when all of them have. Results are merged in registration
/// order: the first provider to report a path owns it, and each provider's
/// own recency order is kept. There is no re-sort across providers.
pub struct Aggregator {
    providers: Vec<Arc<Provider>>,
    last: Mutex<Vec<WorkspaceReference>>,
}

impl Aggregator {
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self { providers: providers.into_iter().map(Arc::new).collect(), last: Mutex::default() }
    }

    /// Every enabled provider from [`ProviderKind::ALL`], with configured
    /// overrides applied.
    pub fn from_config(config: &Config) -> Self {
        for id in config.providers.keys().filter(|id| ProviderKind::from_id(id).is_none()) {
            tracing::warn!(provider = %id, "Unknown provider in configuration; ignoring");
        }
        let providers = ProviderKind::ALL.into_iter().filter_map(|kind| {
            let settings = config.provider(kind.id());
            if !settings.enabled {
                tracing::debug!(provider = %kind, "Provider disabled");
                return None;
            }
            Some(Provider::from_config(kind, &settings))
        });
        Self::new(providers)
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter().map(Arc::as_ref)
    }

    /// One discovery pass over every provider.
    ///
    /// A provider that panics contributes nothing; its siblings are
    /// unaffected.
    #[instrument(skip_all, fields(providers = self.providers.len()))]
    pub async fn discover(&self, cancel: &CancellationToken) -> Vec<WorkspaceReference> {
        let tasks = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || provider.discover(&cancel))
        });
        let results = join_all(tasks).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(references) => {
                    merged.extend(references.into_iter().filter(|reference| seen.insert(reference.path().clone())));
                },
                Err(err) => tracing::warn!(provider = %provider.kind(), error = ?err, "Provider failed; skipping"),
            }
        }
        if cancel.is_cancelled() {
            // Keep the last complete pass for `find` and `launch`.
            tracing::info!("Discovery pass cancelled");
            return merged;
        }
        tracing::info!(workspaces = merged.len(), "Discovery pass complete");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = merged.clone();
        merged
    }

    /// The reference for `path` from the most recent pass.
    pub fn find(&self, path: &str) -> Option<WorkspaceReference> {
        let path = normalize(path)?;
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.iter().find(|reference| reference.path() == &path).cloned()
    }

    /// Launch `path` with the provider that reported it in the most recent
    /// pass. Unknown paths are not launched.
    pub fn launch(&self, path: &str) -> bool {
        let Some(reference) = self.find(path) else {
            tracing::info!(path, "Not a discovered workspace");
            return false;
        };
        match self.providers().find(|provider| provider.kind() == reference.provider()) {
            Some(provider) => provider.launch(reference.path().as_path()),
            None => reference.launch(),
        }
    }
}
