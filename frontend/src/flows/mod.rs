//! Multi-step auth flows.
//!
//! Both OTP flows walk the same small step graph; which edges are legal
//! depends on the flow kind, so the graph lives in [`StepMachine`] rather than
//! in loose booleans on each form.

pub mod reset;
pub mod signin;
pub mod signup;

#[cfg(test)]
pub(crate) mod fakes;

use tracing::debug;

use crate::utils::server::{UserRole, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const OTP_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStep {
  Details,
  AwaitingOtp,
  ResettingPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
  Signup,
  PasswordReset,
}

impl FlowKind {
  pub fn allows(self, from: FlowStep, to: FlowStep) -> bool {
    use FlowStep::*;
    match self {
      FlowKind::Signup => matches!((from, to), (Details, AwaitingOtp) | (AwaitingOtp, Details)),
      FlowKind::PasswordReset => matches!(
        (from, to),
        (Details, AwaitingOtp) | (AwaitingOtp, Details) | (AwaitingOtp, ResettingPassword) | (ResettingPassword, AwaitingOtp)
      ),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMachine {
  kind: FlowKind,
  step: FlowStep,
}

impl StepMachine {
  pub fn new(kind: FlowKind) -> Self {
    Self { kind, step: FlowStep::Details }
  }

  pub fn step(&self) -> FlowStep {
    self.step
  }

  pub fn kind(&self) -> FlowKind {
    self.kind
  }

  pub fn transition(&mut self, to: FlowStep) -> Result<(), ValidationError> {
    if !self.kind.allows(self.step, to) {
      return Err(ValidationError::InvalidTransition { from: self.step, to });
    }
    debug!("{:?} flow: {:?} -> {:?}", self.kind, self.step, to);
    self.step = to;
    Ok(())
  }

  /// Errors unless the machine currently sits on `step`.
  pub fn ensure_at(&self, step: FlowStep) -> Result<(), ValidationError> {
    if self.step == step {
      Ok(())
    } else {
      Err(ValidationError::InvalidTransition { from: self.step, to: step })
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
  Dashboard,
  AdminDashboard,
  SignIn,
}

impl Destination {
  pub fn landing_for(role: &UserRole) -> Self {
    match role {
      UserRole::Admin => Destination::AdminDashboard,
      UserRole::Trader => Destination::Dashboard,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// The flow moved to (or stayed on) this step.
  Step(FlowStep),
  /// The flow finished, the view should route away.
  Navigate(Destination),
}

/// Confirmation first, then length.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
  if password != confirm {
    return Err(ValidationError::PasswordMismatch);
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
  }
  Ok(())
}

pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
  let email = email.trim();
  if email.is_empty() {
    return Err(ValidationError::MissingEmail);
  }
  Ok(email.to_string())
}

/// Trims the code and checks it has exactly [`OTP_LEN`] characters.
pub fn normalize_otp(code: &str) -> Result<String, ValidationError> {
  let code = code.trim();
  if code.chars().count() != OTP_LEN {
    return Err(ValidationError::InvalidOtpLength { expected: OTP_LEN });
  }
  Ok(code.to_string())
}
