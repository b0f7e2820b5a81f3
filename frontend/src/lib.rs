//! Client-side core of the PropDesk trading-challenge dashboard.
//!
//! The state machines in here (auth/OTP flows, resend cooldown, notification
//! sync, admin list filtering) are plain Rust and run anywhere. The `web`
//! feature adds the Dioxus shell that binds them to signals and routes.

pub mod admin;
pub mod flows;
pub mod utils;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod components;
#[cfg(feature = "web")]
pub mod hooks;
#[cfg(feature = "web")]
pub mod pages;
