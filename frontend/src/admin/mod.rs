//! Admin back-office lists: payments with refunds, rule violations.

pub mod filter;
pub mod payments;
pub mod refund;
pub mod violations;

#[cfg(test)]
pub(crate) mod fakes;

pub use filter::{AdminListFilterState, AdminRow, Page, StatusFilter};
pub use payments::{AdminPaymentsView, PaymentStatus, PaymentView};
pub use refund::{RefundDialog, RefundDraft};
pub use violations::{AdminViolationsView, ViolationStatus, ViolationView};
