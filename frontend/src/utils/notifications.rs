//! Notification cache and its poll/mark-read synchronizer.
//!
//! Marking as read is a two-phase commit against the shared [`QueryCache`]:
//! the entry is flipped to read and tagged `Pending` before the request goes
//! out, the tag becomes `Confirmed` when the backend accepts it, and any later
//! refetch that already reports `read: true` drops the tag. A refetch never
//! flips a tagged entry back to unread. On a failed request the tag is dropped
//! and the next successful poll is the source of truth.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api::NotificationApi;
use super::query::{QueryCache, QueryKey};
use super::server::{AppError, Notification, NotificationCategory, NotificationKind};
use super::session::AuthSession;

/// How many entries the header dropdown shows.
pub const DROPDOWN_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMark {
  Pending(Uuid),
  Confirmed(Uuid),
}

impl ReadMark {
  pub fn mutation_id(&self) -> Uuid {
    match self {
      ReadMark::Pending(id) | ReadMark::Confirmed(id) => *id,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedNotification {
  pub notification: Notification,
  pub mark: Option<ReadMark>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationCounts {
  pub total: usize,
  pub unread: usize,
  pub warnings: usize,
  pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
  pub category: Option<NotificationCategory>,
  pub unread_only: bool,
}

impl NotificationFilter {
  pub fn matches(&self, n: &Notification) -> bool {
    self.category.map_or(true, |c| n.category == c) && (!self.unread_only || !n.read)
  }
}

/// Unread first, newest first within each half.
pub fn display_order(a: &Notification, b: &Notification) -> Ordering {
  a.read.cmp(&b.read).then_with(|| b.created_at.cmp(&a.created_at))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationStore {
  entries: Vec<CachedNotification>,
}

impl NotificationStore {
  pub fn from_server(list: Vec<Notification>) -> Self {
    let mut store = Self::default();
    store.reconcile(list);
    store
  }

  /// Replaces the cached list with the server's, carrying over read marks.
  pub fn reconcile(&mut self, server: Vec<Notification>) {
    let entries = server
      .into_iter()
      .map(|mut notification| {
        let previous = self.entries.iter().find(|e| e.notification.id == notification.id);
        let mark = match previous.and_then(|e| e.mark) {
          // server caught up, nothing left to protect
          Some(_) if notification.read => None,
          Some(mark) => {
            notification.read = true;
            Some(mark)
          }
          None => None,
        };
        CachedNotification { notification, mark }
      })
      .collect();
    self.entries = entries;
  }

  /// Phase one. Returns the mark to confirm or release later, `None` if the
  /// id is not cached.
  pub fn apply_optimistic_read(&mut self, id: &str) -> Option<ReadMark> {
    let entry = self.entries.iter_mut().find(|e| e.notification.id == id)?;
    let mark = ReadMark::Pending(Uuid::new_v4());
    entry.notification.read = true;
    entry.mark = Some(mark);
    Some(mark)
  }

  /// Phase one for every unread entry under a single mutation id.
  pub fn apply_optimistic_read_all(&mut self) -> Option<ReadMark> {
    let mark = ReadMark::Pending(Uuid::new_v4());
    let mut touched = false;
    for entry in self.entries.iter_mut().filter(|e| !e.notification.read) {
      entry.notification.read = true;
      entry.mark = Some(mark);
      touched = true;
    }
    touched.then_some(mark)
  }

  /// Phase two: the backend accepted the mutation.
  pub fn confirm(&mut self, mark: ReadMark) {
    let id = mark.mutation_id();
    for entry in self.entries.iter_mut() {
      if entry.mark.map(|m| m.mutation_id()) == Some(id) {
        entry.mark = Some(ReadMark::Confirmed(id));
      }
    }
  }

  /// The mutation failed. The entry stays read until a refetch says otherwise.
  pub fn release(&mut self, mark: ReadMark) {
    let id = mark.mutation_id();
    for entry in self.entries.iter_mut() {
      if entry.mark.map(|m| m.mutation_id()) == Some(id) {
        entry.mark = None;
      }
    }
  }

  pub fn get(&self, id: &str) -> Option<&CachedNotification> {
    self.entries.iter().find(|e| e.notification.id == id)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn sorted(&self) -> Vec<&Notification> {
    self.filtered(&NotificationFilter::default())
  }

  pub fn filtered(&self, filter: &NotificationFilter) -> Vec<&Notification> {
    let mut list: Vec<&Notification> = self
      .entries
      .iter()
      .map(|e| &e.notification)
      .filter(|n| filter.matches(n))
      .collect();
    list.sort_by(|a, b| display_order(a, b));
    list
  }

  pub fn top(&self, n: usize) -> Vec<&Notification> {
    let mut list = self.sorted();
    list.truncate(n);
    list
  }

  pub fn counts(&self) -> NotificationCounts {
    self.entries.iter().map(|e| &e.notification).fold(NotificationCounts::default(), |mut acc, n| {
      acc.total += 1;
      if !n.read {
        acc.unread += 1;
      }
      match n.kind {
        NotificationKind::Warning => acc.warnings += 1,
        NotificationKind::Error => acc.errors += 1,
        _ => {}
      }
      acc
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
  /// No signed-in user id to poll for.
  Skipped,
  /// An identical poll was already running.
  Deduplicated,
  Refreshed { count: usize },
}

#[derive(Clone)]
pub struct NotificationSynchronizer {
  api: Arc<dyn NotificationApi>,
  cache: Arc<QueryCache>,
  session: Arc<AuthSession>,
  interval: Duration,
}

impl NotificationSynchronizer {
  pub fn new(api: Arc<dyn NotificationApi>, cache: Arc<QueryCache>, session: Arc<AuthSession>, interval: Duration) -> Self {
    Self { api, cache, session, interval }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  // (user id, cache key) for the signed-in user
  fn scope(&self) -> Option<(String, QueryKey)> {
    let user_id = self.session.user_id()?;
    let key = QueryKey::Notifications { user_id: user_id.clone() };
    Some((user_id, key))
  }

  /// Current cached view, empty when nothing was fetched yet.
  pub fn snapshot(&self) -> NotificationStore {
    self
      .scope()
      .and_then(|(_, key)| self.cache.get::<NotificationStore>(&key))
      .unwrap_or_default()
  }

  pub async fn poll(&self) -> Result<PollOutcome, AppError> {
    let Some((user_id, key)) = self.scope() else {
      debug!("no signed-in user, skipping notification poll");
      return Ok(PollOutcome::Skipped);
    };
    let Some(_guard) = self.cache.begin_fetch(&key) else {
      return Ok(PollOutcome::Deduplicated);
    };
    let list = self.api.list_notifications(&user_id).await?;
    let count = list.len();
    // read the cache after the await so marks made meanwhile are carried over
    let mut store = self.cache.get::<NotificationStore>(&key).unwrap_or_default();
    store.reconcile(list);
    self.cache.set(key, store);
    Ok(PollOutcome::Refreshed { count })
  }

  /// Optimistic half of [`Self::mark_read`], visible to readers right away.
  pub fn begin_mark_read(&self, id: &str) -> Option<ReadMark> {
    let (_, key) = self.scope()?;
    self
      .cache
      .update(&key, |store: &mut NotificationStore| store.apply_optimistic_read(id))
      .flatten()
  }

  /// Sends the mutation for a mark made by [`Self::begin_mark_read`], then
  /// invalidates and refetches whether or not the backend accepted it.
  pub async fn finish_mark_read(&self, id: &str, mark: Option<ReadMark>) -> Result<(), AppError> {
    let result = self.api.mark_read(id).await;
    if result.is_ok() {
      info!("notification {} marked read", id);
    }
    self.settle(mark, &result);
    self.reconcile_now().await;
    result
  }

  pub async fn mark_read(&self, id: &str) -> Result<(), AppError> {
    let mark = self.begin_mark_read(id);
    self.finish_mark_read(id, mark).await
  }

  pub async fn mark_all_read(&self) -> Result<(), AppError> {
    let Some((user_id, key)) = self.scope() else {
      return Ok(());
    };
    let mark = self
      .cache
      .update(&key, |store: &mut NotificationStore| store.apply_optimistic_read_all())
      .flatten();
    let result = self.api.mark_all_read(&user_id).await;
    self.settle(mark, &result);
    self.reconcile_now().await;
    result
  }

  fn settle(&self, mark: Option<ReadMark>, result: &Result<(), AppError>) {
    let Some((_, key)) = self.scope() else {
      return;
    };
    if let Some(mark) = mark {
      self.cache.update(&key, |store: &mut NotificationStore| match result {
        Ok(()) => store.confirm(mark),
        Err(e) => {
          warn!("mark-read failed, leaving it to the next poll: {}", e);
          store.release(mark)
        }
      });
    }
    self.cache.invalidate(&key);
  }

  /// Refetch right now; a failure just waits for the next interval.
  pub async fn reconcile_now(&self) {
    if let Err(e) = self.poll().await {
      warn!("notification refetch failed: {}", e);
    }
  }

  /// Polls forever at the configured interval. Dropping the future stops it.
  pub async fn run<F>(&self, mut on_refresh: F)
  where
    F: FnMut(NotificationStore),
  {
    loop {
      match self.poll().await {
        Ok(PollOutcome::Refreshed { .. }) => on_refresh(self.snapshot()),
        Ok(_) => {}
        Err(e) => warn!("notification poll failed: {}", e),
      }
      async_std::task::sleep(self.interval).await;
    }
  }
}
