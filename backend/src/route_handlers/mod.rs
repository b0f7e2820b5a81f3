pub mod auth;
pub mod notifications;
pub mod payments;
pub mod violations;
