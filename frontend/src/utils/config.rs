use std::time::Duration;

use super::messages::Locale;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:7575";

// baked in by build.rs when API_BASE_URL is set (directly or through .env)
const BUILD_API_BASE_URL: Option<&str> = option_env!("API_BASE_URL");

/// Refetch cadence per consumer. Nothing here is a system constant, each view
/// picks the interval it polls at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
  pub notifications_page: Duration,
  pub app_shell: Duration,
  pub admin_financial: Duration,
}

impl Default for PollIntervals {
  fn default() -> Self {
    Self {
      notifications_page: Duration::from_secs(5),
      app_shell: Duration::from_secs(5),
      admin_financial: Duration::from_secs(30),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
  pub api_base_url: String,
  pub poll: PollIntervals,
  pub locale: Locale,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self::from_build_env()
  }
}

impl ClientConfig {
  pub fn from_build_env() -> Self {
    Self {
      api_base_url: normalize_base_url(BUILD_API_BASE_URL.unwrap_or(DEFAULT_API_BASE_URL)),
      poll: PollIntervals::default(),
      locale: Locale::default(),
    }
  }

  pub fn with_base_url(mut self, url: &str) -> Self {
    self.api_base_url = normalize_base_url(url);
    self
  }

  pub fn with_locale(mut self, locale: Locale) -> Self {
    self.locale = locale;
    self
  }

  pub fn with_poll_intervals(mut self, poll: PollIntervals) -> Self {
    self.poll = poll;
    self
  }
}

fn normalize_base_url(url: &str) -> String {
  url.trim().trim_end_matches('/').to_string()
}
