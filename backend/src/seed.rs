use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::midwares::app_state::{NotificationRecord, PaymentRecord, Role, Store, UserRecord, ViolationRecord};

pub const DEMO_TRADER_ID: &str = "u-trader";
pub const DEMO_TRADER_EMAIL: &str = "trader@propdesk.dev";
pub const DEMO_TRADER_PASSWORD: &str = "trader123";
pub const DEMO_ADMIN_EMAIL: &str = "admin@propdesk.dev";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";

const PAYMENT_STATUSES: [&str; 7] =
  ["succeeded", "processing", "succeeded", "failed", "refunded", "requires_payment_method", "canceled"];
const CHALLENGE_FEES: [Decimal; 3] = [dec!(99.00), dec!(249.00), dec!(499.00)];

pub fn welcome_notification(user_id: &str) -> NotificationRecord {
  NotificationRecord {
    id: uuid::Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    title: "Welcome to PropDesk".to_string(),
    body: "Pick a challenge to start trading.".to_string(),
    kind: "info".to_string(),
    category: "account".to_string(),
    read: false,
    created_at: Utc::now(),
  }
}

/// Demo users, a trader inbox, a few dozen payments and violations.
pub fn demo_store() -> Store {
  let epoch = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).single().unwrap_or_else(Utc::now);

  let users = vec![
    UserRecord {
      id: DEMO_TRADER_ID.to_string(),
      email: DEMO_TRADER_EMAIL.to_string(),
      password: DEMO_TRADER_PASSWORD.to_string(),
      first_name: Some("Dana".to_string()),
      last_name: Some("Reyes".to_string()),
      role: Role::Trader,
    },
    UserRecord {
      id: "u-admin".to_string(),
      email: DEMO_ADMIN_EMAIL.to_string(),
      password: DEMO_ADMIN_PASSWORD.to_string(),
      first_name: Some("Ops".to_string()),
      last_name: None,
      role: Role::Admin,
    },
  ];

  let inbox = [
    ("Challenge passed", "Phase 1 target reached.", "success", "challenge", false),
    ("Drawdown warning", "You are within 1% of the daily loss limit.", "warning", "challenge", false),
    ("Payout sent", "Your payout of $1,250.00 is on its way.", "success", "payout", true),
    ("Payment failed", "Your card was declined.", "error", "account", false),
    ("Maintenance", "Trading servers restart Sunday 02:00 UTC.", "info", "system", true),
    ("KYC approved", "Your identity has been verified.", "info", "account", true),
  ];
  let notifications = inbox
    .iter()
    .enumerate()
    .map(|(i, (title, body, kind, category, read))| NotificationRecord {
      id: format!("n-{}", i + 1),
      user_id: DEMO_TRADER_ID.to_string(),
      title: title.to_string(),
      body: body.to_string(),
      kind: kind.to_string(),
      category: category.to_string(),
      read: *read,
      created_at: epoch + Duration::hours(i as i64 * 6),
    })
    .collect();

  let payments = (0..27)
    .map(|i| PaymentRecord {
      id: format!("pay-{:03}", i + 1),
      account_id: format!("ACC-{:04}", 1000 + i),
      user_email: Some(format!("trader{}@example.com", i + 1)),
      amount: CHALLENGE_FEES[i % CHALLENGE_FEES.len()],
      currency: "USD".to_string(),
      status: PAYMENT_STATUSES[i % PAYMENT_STATUSES.len()].to_string(),
      transaction_id: Some(format!("pi_{:08x}", 0xA11CE + i * 7919)),
      created_at: epoch + Duration::hours(i as i64 * 11),
      refund_reason: None,
    })
    .collect();

  let rules = [("max_daily_loss", "high"), ("max_drawdown", "high"), ("min_trading_days", "low"), ("news_trading", "medium")];
  let violation_statuses = ["active", "open", "under_review", "resolved", "dismissed"];
  let violations = (0..23)
    .map(|i| {
      let (rule, severity) = rules[i % rules.len()];
      ViolationRecord {
        id: format!("vio-{:03}", i + 1),
        account_id: format!("ACC-{:04}", 1000 + (i * 3) % 27),
        rule: rule.to_string(),
        description: format!("{} breached", rule.replace('_', " ")),
        severity: Some(severity.to_string()),
        status: violation_statuses[i % violation_statuses.len()].to_string(),
        created_at: epoch + Duration::hours(i as i64 * 5),
      }
    })
    .collect();

  Store { users, notifications, payments, violations, ..Store::default() }
}
