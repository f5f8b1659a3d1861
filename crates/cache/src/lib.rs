//! Freshness-aware memoization for on-disk editor state.
//!
//! Each provider reads exactly one resource (a JSON file, a registry hive)
//! and derives a value from it. [`TimestampCache`] keeps the last derived
//! value together with the resource's modification time and hands it back
//! for as long as that time is unchanged. It is not a map: capacity is one
//! entry, replaced wholesale on every rebuild.
//!
//! # Locking
//! The slot mutex is only held to compare or store an entry. Probing the
//! modification time and running the build closure both happen without it,
//! so a slow rebuild never blocks readers of the previous value.

mod stamp;

pub use crate::stamp::Stamp;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Entry<T> {
    /// Case-folded resource identifier.
    key: String,
    stamp: Stamp,
    value: Arc<T>,
}
impl<T> Entry<T> {
    fn is_fresh(&self, key: &str, stamp: &Stamp) -> bool {
        self.key == key && self.stamp.matches(stamp)
    }
}

/// A thread-safe, single-slot cache keyed on `(resource, modification time)`.
///
/// # Example
///
/// ```
/// use revisit_cache::{Stamp, TimestampCache};
/// use std::time::SystemTime;
///
/// let cache = TimestampCache::new();
/// let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
/// let first = cache.get_or_refresh("storage.json", stamp, |_| vec!["a"]);
/// let second = cache.get_or_refresh("STORAGE.JSON", stamp, |_| unreachable!());
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub struct TimestampCache<T> {
    slot: Mutex<Option<Entry<T>>>,
}
impl<T> Default for TimestampCache<T> {
    fn default() -> Self {
        Self { slot: Mutex::new(None) }
    }
}
impl<T> TimestampCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `resource` if it was built from the state
    /// described by `stamp`, otherwise run `build` and cache its result.
    ///
    /// `resource` is compared case-insensitively. When two callers rebuild
    /// the same `(resource, stamp)` concurrently, the first to finish wins
    /// and the other's value is dropped, so both receive the same [`Arc`].
    pub fn get_or_refresh<F>(&self, resource: &str, stamp: Stamp, build: F) -> Arc<T>
    where
        F: FnOnce(&str) -> T,
    {
        let key = resource.to_lowercase();
        if let Some(value) = self.lookup(resource, &key, &stamp) {
            return value;
        }
        self.store(resource, key, stamp, build(resource))
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh), but `build` may give
    /// up. A `None` build stores nothing: the previous entry, or the empty
    /// slot, stays in place and `None` is returned.
    pub fn get_or_try_refresh<F>(&self, resource: &str, stamp: Stamp, build: F) -> Option<Arc<T>>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let key = resource.to_lowercase();
        if let Some(value) = self.lookup(resource, &key, &stamp) {
            return Some(value);
        }
        let Some(value) = build(resource) else {
            tracing::debug!(resource, "Rebuild abandoned; nothing stored");
            return None;
        };
        Some(self.store(resource, key, stamp, value))
    }

    /// [`get_or_refresh`](Self::get_or_refresh) for a file, probing its
    /// modification time before anything else.
    pub fn get_or_refresh_path<F>(&self, path: &Path, build: F) -> Arc<T>
    where
        F: FnOnce(&Path) -> T,
    {
        let stamp = Stamp::probe(path);
        self.get_or_refresh(&path.to_string_lossy(), stamp, |_| build(path))
    }

    /// Drop the cached entry, if any.
    pub fn invalidate(&self) {
        self.slot().take();
    }

    fn lookup(&self, resource: &str, key: &str, stamp: &Stamp) -> Option<Arc<T>> {
        if let Some(entry) = self.slot().as_ref()
            && entry.is_fresh(key, stamp)
        {
            tracing::trace!(resource, "Cache hit");
            return Some(Arc::clone(&entry.value));
        }
        tracing::debug!(resource, known = stamp.is_known(), "Cache miss; rebuilding");
        None
    }

    fn store(&self, resource: &str, key: String, stamp: Stamp, value: T) -> Arc<T> {
        let mut slot = self.slot();
        if let Some(entry) = slot.as_ref()
            && entry.is_fresh(&key, &stamp)
        {
            tracing::trace!(resource, "Concurrent rebuild already stored; discarding ours");
            return Arc::clone(&entry.value);
        }
        let value = Arc::new(value);
        *slot = Some(Entry { key, stamp, value: Arc::clone(&value) });
        value
    }

    fn slot(&self) -> MutexGuard<'_, Option<Entry<T>>> {
        // Entries are swapped in whole, so a panic elsewhere can't leave a
        // half-written slot behind.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    fn counted<'a>(builds: &'a AtomicUsize, value: &'static str) -> impl FnOnce(&str) -> String + 'a {
        move |_| {
            builds.fetch_add(1, Ordering::SeqCst);
            value.to_string()
        }
    }

    #[test]
    fn test_unchanged_stamp_is_served_from_cache() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        let first = cache.get_or_refresh("storage.json", stamp, counted(&builds, "first"));
        let second = cache.get_or_refresh("storage.json", stamp, counted(&builds, "second"));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, "first");
    }

    #[test]
    fn test_changed_stamp_rebuilds() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let before = Stamp::from(SystemTime::UNIX_EPOCH);
        let after = Stamp::from(SystemTime::UNIX_EPOCH + Duration::from_secs(60));
        cache.get_or_refresh("storage.json", before, counted(&builds, "old"));
        let value = cache.get_or_refresh("storage.json", after, counted(&builds, "new"));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(*value, "new");
    }

    #[test]
    fn test_resource_is_case_insensitive() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        cache.get_or_refresh(r"C:\Users\x\storage.json", stamp, counted(&builds, "a"));
        cache.get_or_refresh(r"c:\users\X\STORAGE.json", stamp, counted(&builds, "b"));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        cache.get_or_refresh(r"c:\users\x\other.json", stamp, counted(&builds, "c"));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_stamp_always_rebuilds() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        cache.get_or_refresh("locked.bin", Stamp::Unknown, counted(&builds, "a"));
        let value = cache.get_or_refresh("locked.bin", Stamp::Unknown, counted(&builds, "b"));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(*value, "b");
    }

    #[test]
    fn test_invalidate() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        cache.get_or_refresh("storage.json", stamp, counted(&builds, "a"));
        cache.invalidate();
        cache.get_or_refresh("storage.json", stamp, counted(&builds, "b"));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_abandoned_rebuild_keeps_previous_entry() {
        let cache = TimestampCache::new();
        let before = Stamp::from(SystemTime::UNIX_EPOCH);
        let after = Stamp::from(SystemTime::UNIX_EPOCH + Duration::from_secs(60));
        let complete = cache.get_or_refresh("privateregistry.bin", before, |_| vec!["a.sln", "b.sln"]);

        assert!(cache.get_or_try_refresh("privateregistry.bin", after, |_| None).is_none());
        let served = cache.get_or_refresh("privateregistry.bin", before, |_| unreachable!());
        assert!(Arc::ptr_eq(&complete, &served));
        assert_eq!(served.len(), 2);
    }

    #[test]
    fn test_abandoned_rebuild_leaves_slot_empty() {
        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        assert!(cache.get_or_try_refresh("privateregistry.bin", stamp, |_| None::<String>).is_none());
        // A later caller with the same stamp must rebuild rather than see a partial value.
        let value = cache.get_or_refresh("privateregistry.bin", stamp, counted(&builds, "full"));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(*value, "full");
    }

    #[test]
    fn test_build_runs_without_lock() {
        let cache = TimestampCache::new();
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        // Re-entering the cache from inside the build closure would deadlock
        // if the slot were still locked.
        let outer = cache.get_or_refresh("outer", stamp, |_| {
            let inner = cache.get_or_refresh("inner", stamp, |_| 1);
            *inner + 1
        });
        assert_eq!(*outer, 2);
    }

    #[test]
    fn test_concurrent_rebuilds_share_the_winner() {
        let cache = TimestampCache::new();
        let barrier = Barrier::new(2);
        let stamp = Stamp::from(SystemTime::UNIX_EPOCH);
        let (a, b) = std::thread::scope(|s| {
            let build = |label: &'static str| {
                let cache = &cache;
                let barrier = &barrier;
                move || {
                    cache.get_or_refresh("storage.json", stamp, |_| {
                        // Both threads are past the lookup before either stores.
                        barrier.wait();
                        label.to_string()
                    })
                }
            };
            let a = s.spawn(build("a"));
            let b = s.spawn(build("b"));
            (a.join().unwrap(), b.join().unwrap())
        });
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_get_or_refresh_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("storage.json");
        std::fs::write(&path, b"{}").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)).unwrap();

        let cache = TimestampCache::new();
        let builds = AtomicUsize::new(0);
        let build = |_: &Path| builds.fetch_add(1, Ordering::SeqCst);
        cache.get_or_refresh_path(&path, build);
        cache.get_or_refresh_path(&path, build);
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(2_000)).unwrap();
        cache.get_or_refresh_path(&path, build);
        assert_eq!(builds.load(Ordering::SeqCst), 2);

        drop(file);
        std::fs::remove_file(&path).unwrap();
        cache.get_or_refresh_path(&path, build);
        cache.get_or_refresh_path(&path, build);
        assert_eq!(builds.load(Ordering::SeqCst), 4);
    }
}
