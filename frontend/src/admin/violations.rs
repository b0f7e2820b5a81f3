use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::filter::{AdminListFilterState, AdminRow, StatusFilter, UnknownStatus};
use crate::utils::api::AdminApi;
use crate::utils::messages::Locale;
use crate::utils::query::{QueryCache, QueryKey};
use crate::utils::server::{AppError, RawViolation, RawViolationStatus, ViolationStats};

pub const VIOLATIONS_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationStatus {
  Active,
  UnderReview,
  Resolved,
  Dismissed,
}

impl ViolationStatus {
  pub const ALL: [ViolationStatus; 4] =
    [ViolationStatus::Active, ViolationStatus::UnderReview, ViolationStatus::Resolved, ViolationStatus::Dismissed];

  pub fn as_str(&self) -> &'static str {
    match self {
      ViolationStatus::Active => "active",
      ViolationStatus::UnderReview => "under_review",
      ViolationStatus::Resolved => "resolved",
      ViolationStatus::Dismissed => "dismissed",
    }
  }

  pub fn label(&self, locale: Locale) -> &'static str {
    match (self, locale) {
      (ViolationStatus::Active, Locale::En) => "Active",
      (ViolationStatus::UnderReview, Locale::En) => "Under review",
      (ViolationStatus::Resolved, Locale::En) => "Resolved",
      (ViolationStatus::Dismissed, Locale::En) => "Dismissed",
      (ViolationStatus::Active, Locale::Es) => "Activa",
      (ViolationStatus::UnderReview, Locale::Es) => "En revisión",
      (ViolationStatus::Resolved, Locale::Es) => "Resuelta",
      (ViolationStatus::Dismissed, Locale::Es) => "Descartada",
    }
  }
}

impl From<RawViolationStatus> for ViolationStatus {
  fn from(raw: RawViolationStatus) -> Self {
    match raw {
      RawViolationStatus::Active | RawViolationStatus::Open | RawViolationStatus::Unknown => ViolationStatus::Active,
      RawViolationStatus::UnderReview => ViolationStatus::UnderReview,
      RawViolationStatus::Resolved => ViolationStatus::Resolved,
      RawViolationStatus::Dismissed => ViolationStatus::Dismissed,
    }
  }
}

impl FromStr for ViolationStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ViolationStatus::ALL
      .into_iter()
      .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| UnknownStatus(s.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolationView {
  pub id: String,
  pub account_id: String,
  pub rule: String,
  pub description: String,
  pub severity: Option<String>,
  pub status: ViolationStatus,
  pub created_at: DateTime<Utc>,
}

impl From<RawViolation> for ViolationView {
  fn from(raw: RawViolation) -> Self {
    Self {
      id: raw.id,
      account_id: raw.account_id,
      rule: raw.rule,
      description: raw.description,
      severity: raw.severity,
      status: raw.status.into(),
      created_at: raw.created_at,
    }
  }
}

impl AdminRow for ViolationView {
  type Status = ViolationStatus;

  fn search_fields(&self) -> Vec<&str> {
    vec![self.id.as_str(), self.account_id.as_str(), self.rule.as_str()]
  }

  fn status(&self) -> ViolationStatus {
    self.status
  }
}

/// One server page as cached under `QueryKey::Violations { page }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationPageView {
  pub rows: Vec<ViolationView>,
  pub total: u64,
  pub total_pages: u32,
  pub stats: ViolationStats,
}

/// Admin violations table. Pages come from the server; search and status
/// only narrow the page that is loaded.
#[derive(Clone)]
pub struct AdminViolationsView {
  api: Arc<dyn AdminApi>,
  cache: Arc<QueryCache>,
  total_pages: u32,
  pub filter: AdminListFilterState<ViolationStatus>,
}

impl AdminViolationsView {
  pub fn new(api: Arc<dyn AdminApi>, cache: Arc<QueryCache>) -> Self {
    Self { api, cache, total_pages: 1, filter: AdminListFilterState::default() }
  }

  fn key(&self) -> QueryKey {
    QueryKey::Violations { page: self.filter.page }
  }

  /// Loads the current page unless it is cached and fresh.
  pub async fn refresh_if_stale(&mut self) -> Result<bool, AppError> {
    if !self.cache.is_stale(&self.key()) {
      if let Some(page) = self.current() {
        self.total_pages = page.total_pages.max(1);
      }
      return Ok(false);
    }
    self.load_page().await
  }

  pub async fn load_page(&mut self) -> Result<bool, AppError> {
    let key = self.key();
    let Some(_guard) = self.cache.begin_fetch(&key) else {
      return Ok(false);
    };
    let resp = self.api.list_violations(self.filter.page, VIOLATIONS_PAGE_SIZE).await?;
    debug!("violations page {} of {}", self.filter.page, resp.total_pages);
    let page = ViolationPageView {
      rows: resp.data.into_iter().map(ViolationView::from).collect(),
      total: resp.total,
      total_pages: resp.total_pages.max(1),
      stats: resp.stats,
    };
    self.total_pages = page.total_pages;
    self.cache.set(key, page);
    Ok(true)
  }

  pub fn total_pages(&self) -> u32 {
    self.total_pages
  }

  pub fn current(&self) -> Option<ViolationPageView> {
    self.cache.get::<ViolationPageView>(&self.key())
  }

  pub fn stats(&self) -> ViolationStats {
    self.current().map(|p| p.stats).unwrap_or_default()
  }

  pub fn filtered(&self) -> Vec<ViolationView> {
    self.current().map(|p| self.filter.filter_page(&p.rows)).unwrap_or_default()
  }

  /// Moves to `page` (clamped) and loads it if needed.
  pub async fn go_to(&mut self, page: u32) -> Result<u32, AppError> {
    let page = self.filter.set_page(page, self.total_pages);
    self.refresh_if_stale().await?;
    Ok(page)
  }

  pub fn set_search(&mut self, query: &str) {
    self.filter.set_search(query);
  }

  pub fn set_status(&mut self, value: &str) {
    self.filter.set_status(StatusFilter::parse(value));
  }

  pub fn invalidate(&self) {
    self.cache.invalidate_where(|k| matches!(k, QueryKey::Violations { .. }));
  }
}
