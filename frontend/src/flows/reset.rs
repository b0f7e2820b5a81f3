use std::sync::Arc;

use tracing::{debug, info};

use super::{normalize_email, normalize_otp, validate_new_password, Destination, FlowKind, FlowOutcome, FlowStep, StepMachine};
use crate::utils::api::AuthApi;
use crate::utils::clock::Clock;
use crate::utils::cooldown::Cooldown;
use crate::utils::messages::Locale;
use crate::utils::server::{AppError, ForgotPasswordRequest, ResetPasswordRequest, ValidationError};

/// Forgot password: email -> code -> new password -> back to sign-in.
///
/// There is no standalone verify call for reset codes. The code is only
/// length-checked locally and travels with the new password; a wrong code
/// surfaces as a failure on the last step.
#[derive(Clone)]
pub struct PasswordResetFlow {
  api: Arc<dyn AuthApi>,
  clock: Arc<dyn Clock>,
  locale: Locale,
  machine: StepMachine,
  email: String,
  otp: String,
  cooldown: Cooldown,
  busy: bool,
  error: Option<String>,
}

impl PasswordResetFlow {
  pub fn new(api: Arc<dyn AuthApi>, clock: Arc<dyn Clock>, locale: Locale) -> Self {
    Self {
      api,
      clock,
      locale,
      machine: StepMachine::new(FlowKind::PasswordReset),
      email: String::new(),
      otp: String::new(),
      cooldown: Cooldown::default(),
      busy: false,
      error: None,
    }
  }

  pub fn step(&self) -> FlowStep {
    self.machine.step()
  }

  pub fn email(&self) -> &str {
    &self.email
  }

  pub fn otp(&self) -> &str {
    &self.otp
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_busy(&self) -> bool {
    self.busy
  }

  pub fn cooldown(&self) -> Cooldown {
    self.cooldown
  }

  pub fn cooldown_seconds(&self) -> u64 {
    self.cooldown.remaining_secs(self.clock.now())
  }

  pub fn ticker_active(&self) -> bool {
    self.step() == FlowStep::AwaitingOtp && self.cooldown_seconds() > 0
  }

  pub fn can_resend(&self) -> bool {
    self.step() == FlowStep::AwaitingOtp && !self.busy && self.cooldown_seconds() == 0
  }

  fn fail(&mut self, err: AppError) -> AppError {
    debug!("password reset step {:?} failed: {}", self.step(), err);
    self.error = Some(err.user_message(self.locale));
    err
  }

  pub async fn submit_details(&mut self, email: &str) -> Result<FlowOutcome, AppError> {
    self.error = None;
    let checked = self.machine.ensure_at(FlowStep::Details).and_then(|_| normalize_email(email));
    match checked {
      Ok(email) => self.email = email,
      Err(e) => return Err(self.fail(e.into())),
    }
    self.send_code().await
  }

  async fn send_code(&mut self) -> Result<FlowOutcome, AppError> {
    let req = ForgotPasswordRequest { email: self.email.clone() };
    self.busy = true;
    let result = self.api.forgot_password(&req).await;
    self.busy = false;
    match result {
      Ok(resp) => {
        self.cooldown.reset(resp.resend_available_at);
        if self.step() == FlowStep::Details {
          self.otp.clear();
          self.machine.transition(FlowStep::AwaitingOtp)?;
        }
        info!("password reset code sent");
        Ok(FlowOutcome::Step(self.step()))
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  pub fn submit_otp(&mut self, code: &str) -> Result<FlowOutcome, AppError> {
    self.error = None;
    let checked = self.machine.ensure_at(FlowStep::AwaitingOtp).and_then(|_| normalize_otp(code));
    match checked {
      Ok(otp) => self.otp = otp,
      Err(e) => {
        self.otp = code.to_string();
        return Err(self.fail(e.into()));
      }
    }
    self.machine.transition(FlowStep::ResettingPassword)?;
    Ok(FlowOutcome::Step(FlowStep::ResettingPassword))
  }

  pub async fn submit_new_password(&mut self, password: &str, confirm: &str) -> Result<FlowOutcome, AppError> {
    self.error = None;
    let checked = self
      .machine
      .ensure_at(FlowStep::ResettingPassword)
      .and_then(|_| validate_new_password(password, confirm));
    if let Err(e) = checked {
      return Err(self.fail(e.into()));
    }
    let req = ResetPasswordRequest {
      email: self.email.clone(),
      otp: self.otp.clone(),
      new_password: password.to_string(),
    };
    self.busy = true;
    let result = self.api.reset_password(&req).await;
    self.busy = false;
    match result {
      Ok(()) => {
        info!("password reset completed");
        Ok(FlowOutcome::Navigate(Destination::SignIn))
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  pub async fn resend(&mut self) -> Result<FlowOutcome, AppError> {
    self.error = None;
    if let Err(e) = self.machine.ensure_at(FlowStep::AwaitingOtp) {
      return Err(self.fail(e.into()));
    }
    let seconds = self.cooldown_seconds();
    if seconds > 0 {
      return Err(self.fail(ValidationError::CooldownActive { seconds }.into()));
    }
    self.send_code().await
  }

  pub fn go_back(&mut self) -> Result<FlowOutcome, AppError> {
    let to = match self.step() {
      FlowStep::ResettingPassword => FlowStep::AwaitingOtp,
      FlowStep::AwaitingOtp => FlowStep::Details,
      FlowStep::Details => FlowStep::Details,
    };
    if let Err(e) = self.machine.transition(to) {
      return Err(self.fail(e.into()));
    }
    if to == FlowStep::Details {
      self.otp.clear();
    }
    self.error = None;
    Ok(FlowOutcome::Step(to))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flows::fakes::{t0, FakeAuth};
  use crate::utils::clock::ManualClock;

  fn flow() -> (PasswordResetFlow, Arc<FakeAuth>, ManualClock) {
    let clock = ManualClock::new(t0());
    let api = FakeAuth::new(clock.clone());
    let flow = PasswordResetFlow::new(api.clone(), Arc::new(clock.clone()), Locale::En);
    (flow, api, clock)
  }

  async fn at_password_step() -> (PasswordResetFlow, Arc<FakeAuth>, ManualClock) {
    let (mut flow, api, clock) = flow();
    flow.submit_details(" a@b.com ").await.unwrap();
    flow.submit_otp("123456").unwrap();
    (flow, api, clock)
  }

  #[tokio::test]
  async fn happy_path_ends_at_sign_in() {
    let (mut flow, api, _) = at_password_step().await;
    let outcome = flow.submit_new_password("newpass", "newpass").await.unwrap();
    assert_eq!(outcome, FlowOutcome::Navigate(Destination::SignIn));

    let sent = api.last_reset.lock().unwrap().clone().unwrap();
    assert_eq!(sent.email, "a@b.com");
    assert_eq!(sent.otp, "123456");
    assert_eq!(sent.new_password, "newpass");
  }

  #[tokio::test]
  async fn empty_email_never_hits_backend() {
    let (mut flow, api, _) = flow();
    let err = flow.submit_details("   ").await.unwrap_err();
    assert_eq!(err, AppError::Validation(ValidationError::MissingEmail));
    assert_eq!(api.calls("forgot_password"), 0);
    assert_eq!(flow.step(), FlowStep::Details);
  }

  #[tokio::test]
  async fn wrong_length_code_stays_on_code_step() {
    let (mut flow, _, _) = flow();
    flow.submit_details("a@b.com").await.unwrap();
    assert!(flow.submit_otp("12 34").is_err());
    assert_eq!(flow.step(), FlowStep::AwaitingOtp);
    assert!(flow.error().is_some());
  }

  #[tokio::test]
  async fn rejected_reset_stays_on_password_step() {
    let (mut flow, api, _) = at_password_step().await;
    api.fail("reset_password", AppError::Remote { status: 400, message: Some("Invalid or expired code".into()) });
    flow.submit_new_password("newpass", "newpass").await.unwrap_err();
    assert_eq!(flow.step(), FlowStep::ResettingPassword);
    assert_eq!(flow.error(), Some("Invalid or expired code"));

    // user goes back to fix the code and tries again
    flow.go_back().unwrap();
    assert_eq!(flow.step(), FlowStep::AwaitingOtp);
    api.succeed("reset_password");
    flow.submit_otp("654321").unwrap();
    assert!(matches!(flow.submit_new_password("newpass", "newpass").await, Ok(FlowOutcome::Navigate(_))));
    assert_eq!(api.calls("reset_password"), 2);
  }

  #[tokio::test]
  async fn password_rules_apply_before_request() {
    let (mut flow, api, _) = at_password_step().await;
    let err = flow.submit_new_password("short", "short").await.unwrap_err();
    assert_eq!(err, AppError::Validation(ValidationError::PasswordTooShort { min: 6 }));
    flow.submit_new_password("abcdef", "abcdeg").await.unwrap_err();
    assert_eq!(api.calls("reset_password"), 0);
  }

  #[tokio::test]
  async fn resend_follows_cooldown() {
    let (mut flow, api, clock) = flow();
    flow.submit_details("a@b.com").await.unwrap();
    assert!(flow.ticker_active());
    assert!(flow.resend().await.is_err());
    clock.advance(chrono::Duration::seconds(60));
    assert_eq!(flow.cooldown_seconds(), 0);
    flow.resend().await.unwrap();
    assert_eq!(api.calls("forgot_password"), 2);
  }

  #[tokio::test]
  async fn go_back_walks_one_step() {
    let (mut flow, _, _) = at_password_step().await;
    assert_eq!(flow.go_back().unwrap(), FlowOutcome::Step(FlowStep::AwaitingOtp));
    assert_eq!(flow.go_back().unwrap(), FlowOutcome::Step(FlowStep::Details));
    assert_eq!(flow.otp(), "");
    assert_eq!(flow.email(), "a@b.com");
    assert!(flow.go_back().is_err());
  }
}
