use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

/// Identity of a server-state entry: resource type plus whatever scopes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  Notifications { user_id: String },
  Payments,
  PaymentStatistics,
  Violations { page: u32 },
}

impl QueryKey {
  pub fn resource(&self) -> &'static str {
    match self {
      QueryKey::Notifications { .. } => "notifications",
      QueryKey::Payments => "payments",
      QueryKey::PaymentStatistics => "payment-statistics",
      QueryKey::Violations { .. } => "violations",
    }
  }
}

struct Entry {
  value: Arc<dyn Any + Send + Sync>,
  stale: bool,
}

/// Shared server-state cache.
///
/// Values are stored type-erased; readers ask for the type they put in.
/// Invalidation only flags entries, the owning view decides when to refetch.
#[derive(Default)]
pub struct QueryCache {
  entries: RwLock<HashMap<QueryKey, Entry>>,
  in_flight: Mutex<HashSet<QueryKey>>,
}

impl QueryCache {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.get(key).and_then(|e| e.value.downcast_ref::<T>()).cloned()
  }

  /// Stores fresh data and clears the stale flag.
  pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    entries.insert(key, Entry { value: Arc::new(value), stale: false });
  }

  /// Patches a cached value in place, keeping its stale flag. Returns `None`
  /// when nothing of type `T` is cached under `key`.
  pub fn update<T, R, F>(&self, key: &QueryKey, f: F) -> Option<R>
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&mut T) -> R,
  {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    let entry = entries.get_mut(key)?;
    let mut value = entry.value.downcast_ref::<T>()?.clone();
    let out = f(&mut value);
    entry.value = Arc::new(value);
    Some(out)
  }

  pub fn invalidate(&self, key: &QueryKey) {
    self.invalidate_where(|k| k == key);
  }

  pub fn invalidate_where<P: Fn(&QueryKey) -> bool>(&self, pred: P) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    for (key, entry) in entries.iter_mut().filter(|(k, _)| pred(k)) {
      debug!("invalidated query {:?}", key);
      entry.stale = true;
    }
  }

  /// Missing entries count as stale.
  pub fn is_stale(&self, key: &QueryKey) -> bool {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.get(key).map_or(true, |e| e.stale)
  }

  pub fn remove_where<P: Fn(&QueryKey) -> bool>(&self, pred: P) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    entries.retain(|k, _| !pred(k));
  }

  pub fn clear(&self) {
    self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
  }

  /// Claims the right to fetch `key`. `None` means an identical fetch is
  /// already running and this one should be dropped.
  pub fn begin_fetch(self: &Arc<Self>, key: &QueryKey) -> Option<FetchGuard> {
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if !in_flight.insert(key.clone()) {
      debug!("dedup: fetch for {:?} already in flight", key);
      return None;
    }
    Some(FetchGuard { cache: Arc::clone(self), key: key.clone() })
  }

  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
  }
}

/// Releases the in-flight claim when dropped, whatever the fetch outcome.
pub struct FetchGuard {
  cache: Arc<QueryCache>,
  key: QueryKey,
}

impl FetchGuard {
  pub fn key(&self) -> &QueryKey {
    &self.key
  }
}

impl Drop for FetchGuard {
  fn drop(&mut self) {
    self.cache.in_flight.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.key);
  }
}
