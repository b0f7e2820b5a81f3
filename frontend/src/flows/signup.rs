use std::sync::Arc;

use tracing::{debug, info};

use super::{normalize_email, normalize_otp, validate_new_password, Destination, FlowKind, FlowOutcome, FlowStep, StepMachine};
use crate::utils::api::AuthApi;
use crate::utils::clock::Clock;
use crate::utils::cooldown::Cooldown;
use crate::utils::messages::Locale;
use crate::utils::server::{AppError, AuthResponse, RequestOtpRequest, ValidationError, VerifyOtpRequest};
use crate::utils::session::AuthSession;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupDetails {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
}

fn non_empty(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_string())
}

/// Sign-up: details -> emailed OTP -> signed in.
#[derive(Clone)]
pub struct SignupFlow {
  api: Arc<dyn AuthApi>,
  session: Arc<AuthSession>,
  clock: Arc<dyn Clock>,
  locale: Locale,
  machine: StepMachine,
  details: SignupDetails,
  otp: String,
  cooldown: Cooldown,
  busy: bool,
  error: Option<String>,
}

impl SignupFlow {
  pub fn new(api: Arc<dyn AuthApi>, session: Arc<AuthSession>, clock: Arc<dyn Clock>, locale: Locale) -> Self {
    Self {
      api,
      session,
      clock,
      locale,
      machine: StepMachine::new(FlowKind::Signup),
      details: SignupDetails::default(),
      otp: String::new(),
      cooldown: Cooldown::default(),
      busy: false,
      error: None,
    }
  }

  pub fn step(&self) -> FlowStep {
    self.machine.step()
  }

  pub fn details(&self) -> &SignupDetails {
    &self.details
  }

  pub fn otp(&self) -> &str {
    &self.otp
  }

  pub fn set_otp(&mut self, code: &str) {
    self.otp = code.to_string();
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

  /// Whether a per-second countdown should be running right now.
  pub fn ticker_active(&self) -> bool {
    self.step() == FlowStep::AwaitingOtp && self.cooldown_seconds() > 0
  }

  pub fn can_resend(&self) -> bool {
    self.step() == FlowStep::AwaitingOtp && !self.busy && self.cooldown_seconds() == 0
  }

  fn fail(&mut self, err: AppError) -> AppError {
    debug!("signup step {:?} failed: {}", self.step(), err);
    self.error = Some(err.user_message(self.locale));
    err
  }

  pub async fn submit_details(&mut self, details: SignupDetails) -> Result<FlowOutcome, AppError> {
    self.error = None;
    let checked = self
      .machine
      .ensure_at(FlowStep::Details)
      .and_then(|_| normalize_email(&details.email))
      .and_then(|email| validate_new_password(&details.password, &details.confirm_password).map(|_| email));
    let email = match checked {
      Ok(email) => email,
      Err(e) => return Err(self.fail(e.into())),
    };
    self.details = SignupDetails { email, ..details };
    self.request_otp().await
  }

  async fn request_otp(&mut self) -> Result<FlowOutcome, AppError> {
    let req = RequestOtpRequest {
      email: self.details.email.clone(),
      password: self.details.password.clone(),
      first_name: non_empty(&self.details.first_name),
      last_name: non_empty(&self.details.last_name),
    };
    self.busy = true;
    let result = self.api.request_signup_otp(&req).await;
    self.busy = false;
    match result {
      Ok(resp) => {
        self.cooldown.reset(resp.resend_available_at);
        if self.step() == FlowStep::Details {
          self.otp.clear();
          self.machine.transition(FlowStep::AwaitingOtp)?;
        }
        info!("signup code sent, resend in {}s", self.cooldown_seconds());
        Ok(FlowOutcome::Step(self.step()))
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  pub async fn submit_otp(&mut self, code: &str) -> Result<FlowOutcome, AppError> {
    self.error = None;
    self.otp = code.to_string();
    let checked = self.machine.ensure_at(FlowStep::AwaitingOtp).and_then(|_| normalize_otp(code));
    let otp = match checked {
      Ok(otp) => otp,
      Err(e) => return Err(self.fail(e.into())),
    };
    let req = VerifyOtpRequest {
      email: self.details.email.clone(),
      otp,
      password: self.details.password.clone(),
      first_name: non_empty(&self.details.first_name),
      last_name: non_empty(&self.details.last_name),
    };
    self.busy = true;
    let result = self.api.verify_signup_otp(&req).await;
    self.busy = false;
    match result {
      Ok(AuthResponse { access_token, user }) => {
        let destination = Destination::landing_for(&user.role);
        if let Err(e) = self.session.sign_in(access_token, user) {
          return Err(self.fail(e));
        }
        info!("signup verified, routing to {:?}", destination);
        Ok(FlowOutcome::Navigate(destination))
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Same request as the details step, with the stored fields.
  pub async fn resend(&mut self) -> Result<FlowOutcome, AppError> {
    self.error = None;
    if let Err(e) = self.machine.ensure_at(FlowStep::AwaitingOtp) {
      return Err(self.fail(e.into()));
    }
    let seconds = self.cooldown_seconds();
    if seconds > 0 {
      return Err(self.fail(ValidationError::CooldownActive { seconds }.into()));
    }
    self.request_otp().await
  }

  /// Back to the details form. Entered name, email and password survive.
  pub fn go_back(&mut self) -> Result<FlowOutcome, AppError> {
    if let Err(e) = self.machine.transition(FlowStep::Details) {
      return Err(self.fail(e.into()));
    }
    self.otp.clear();
    self.error = None;
    Ok(FlowOutcome::Step(FlowStep::Details))
  }
}
