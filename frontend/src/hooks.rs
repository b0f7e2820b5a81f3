//! Dioxus bindings for the plain-Rust state machines.

use std::ops::ControlFlow;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use tracing::warn;

use crate::app::{AppContext, SessionSignal};
use crate::utils::cooldown::{run_ticker, Cooldown};
use crate::utils::notifications::{NotificationStore, NotificationSynchronizer};
use crate::utils::session::SessionState;

pub fn use_app() -> AppContext {
  use_context::<AppContext>()
}

/// Reactive session plus a way to resync it after sign-in or sign-out.
#[derive(Clone, Copy)]
pub struct UseAuthSession {
  state: Signal<SessionState>,
}

impl UseAuthSession {
  pub fn read(&self) -> SessionState {
    (self.state)()
  }

  pub fn sync(&mut self, ctx: &AppContext) {
    self.state.set(ctx.session.snapshot());
  }
}

pub fn use_auth_session() -> UseAuthSession {
  let SessionSignal(state) = use_context::<SessionSignal>();
  UseAuthSession { state }
}

/// Seconds left before a resend is allowed. `target` is `None` whenever no
/// OTP step is on screen, which stops the ticker.
pub fn use_cooldown(target: ReadOnlySignal<Option<DateTime<Utc>>>) -> Signal<u64> {
  let ctx = use_app();
  let mut seconds = use_signal(|| 0u64);

  // re-runs (and drops the previous ticker) whenever `target` changes
  let _ = use_resource(move || {
    let clock = ctx.clock.clone();
    async move {
      let cooldown = target().map(Cooldown::until).unwrap_or_default();
      run_ticker(cooldown, clock.as_ref(), |left| {
        seconds.set(left);
        ControlFlow::Continue(())
      })
      .await;
    }
  });

  seconds
}

#[derive(Clone)]
pub struct UseNotifications {
  pub store: Signal<NotificationStore>,
  sync: NotificationSynchronizer,
}

impl UseNotifications {
  /// Flips the entry to read at once; the request and refetch run in the background.
  pub fn mark_read(&self, id: String) {
    let mut store = self.store;
    let sync = self.sync.clone();
    let mark = sync.begin_mark_read(&id);
    store.set(sync.snapshot());
    spawn(async move {
      if let Err(e) = sync.finish_mark_read(&id, mark).await {
        warn!("mark read failed for {}: {}", id, e);
      }
      store.set(sync.snapshot());
    });
  }

  pub fn mark_all_read(&self) {
    let mut store = self.store;
    let sync = self.sync.clone();
    spawn(async move {
      if let Err(e) = sync.mark_all_read().await {
        warn!("mark all read failed: {}", e);
      }
      store.set(sync.snapshot());
    });
  }
}

/// Polls the signed-in user's notifications every `interval` while mounted.
pub fn use_notifications(interval: Duration) -> UseNotifications {
  let ctx = use_app();
  let sync = use_hook(|| NotificationSynchronizer::new(ctx.api.clone(), ctx.cache.clone(), ctx.session.clone(), interval));
  let mut store = use_signal(|| sync.snapshot());

  let poller = sync.clone();
  use_future(move || {
    let poller = poller.clone();
    async move { poller.run(|snapshot| store.set(snapshot)).await }
  });

  UseNotifications { store, sync }
}
