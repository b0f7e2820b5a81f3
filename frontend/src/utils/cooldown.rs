use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::clock::Clock;

pub const TICK: Duration = Duration::from_secs(1);

/// Resend cooldown driven by the server's `resendAvailableAt`.
///
/// Holds only the target instant. The remaining seconds are always derived
/// from a clock reading, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
  resend_available_at: Option<DateTime<Utc>>,
}

impl Cooldown {
  pub fn until(at: DateTime<Utc>) -> Self {
    Self { resend_available_at: Some(at) }
  }

  pub fn resend_available_at(&self) -> Option<DateTime<Utc>> {
    self.resend_available_at
  }

  pub fn reset(&mut self, at: Option<DateTime<Utc>>) {
    self.resend_available_at = at;
  }

  pub fn clear(&mut self) {
    self.resend_available_at = None;
  }

  /// `max(0, ceil((target - now) / 1000))`
  pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
    let Some(target) = self.resend_available_at else {
      return 0;
    };
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
      0
    } else {
      ((millis + 999) / 1000) as u64
    }
  }

  pub fn is_active(&self, now: DateTime<Utc>) -> bool {
    self.remaining_secs(now) > 0
  }

  /// Delay until the next recompute, `None` once there is nothing left to count.
  pub fn next_tick(&self, now: DateTime<Utc>) -> Option<Duration> {
    self.is_active(now).then_some(TICK)
  }
}

/// Reports the remaining seconds once immediately, then once per second until
/// the cooldown hits zero or `on_tick` breaks. No timer is left behind afterwards.
pub async fn run_ticker<F>(cooldown: Cooldown, clock: &dyn Clock, mut on_tick: F)
where
  F: FnMut(u64) -> ControlFlow<()>,
{
  if on_tick(cooldown.remaining_secs(clock.now())).is_break() {
    return;
  }
  while let Some(delay) = cooldown.next_tick(clock.now()) {
    async_std::task::sleep(delay).await;
    if on_tick(cooldown.remaining_secs(clock.now())).is_break() {
      return;
    }
  }
}
