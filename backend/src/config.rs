use std::net::SocketAddr;

use chrono::Duration;
use tracing::warn;

/// Stub server settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct StubConfig {
  pub bind: SocketAddr,
  /// Every OTP the stub "emails" is this code.
  pub otp_code: String,
  pub resend_cooldown: Duration,
  pub token_key: String,
}

impl Default for StubConfig {
  fn default() -> Self {
    Self {
      bind: SocketAddr::from(([0, 0, 0, 0], 7575)),
      otp_code: "123456".to_string(),
      resend_cooldown: Duration::seconds(60),
      token_key: "propdesk-dev-key".to_string(),
    }
  }
}

impl StubConfig {
  pub fn from_env() -> Self {
    let _ = dotenvy::dotenv();
    let mut config = Self::default();

    if let Ok(bind) = std::env::var("PROPDESK_BIND") {
      match bind.parse() {
        Ok(addr) => config.bind = addr,
        Err(e) => warn!("ignoring PROPDESK_BIND={:?}: {}", bind, e),
      }
    }
    if let Ok(code) = std::env::var("PROPDESK_OTP_CODE") {
      config.otp_code = code;
    }
    if let Ok(secs) = std::env::var("PROPDESK_RESEND_COOLDOWN_SECS") {
      match parse_cooldown(&secs) {
        Some(cooldown) => config.resend_cooldown = cooldown,
        None => warn!("ignoring PROPDESK_RESEND_COOLDOWN_SECS={:?}: not a whole number of seconds in range", secs),
      }
    }
    if let Ok(key) = std::env::var("PROPDESK_TOKEN_KEY") {
      config.token_key = key;
    }
    config
  }

  /// Ephemeral port on loopback, no cooldown. Used by tests.
  pub fn for_tests() -> Self {
    Self {
      bind: SocketAddr::from(([127, 0, 0, 1], 0)),
      resend_cooldown: Duration::seconds(0),
      ..Self::default()
    }
  }
}

/// Non-negative whole seconds that fit a `chrono::Duration`.
fn parse_cooldown(raw: &str) -> Option<Duration> {
  let secs = raw.trim().parse::<i64>().ok()?;
  if secs < 0 {
    return None;
  }
  Duration::try_seconds(secs)
}
