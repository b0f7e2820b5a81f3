use dioxus::prelude::*;

use crate::app::Route;
use crate::components::toast::FormError;
use crate::flows::reset::PasswordResetFlow;
use crate::flows::signin::{sign_in, SignInForm};
use crate::flows::signup::{SignupDetails, SignupFlow};
use crate::flows::{FlowOutcome, FlowStep};
use crate::hooks::{use_app, use_auth_session, use_cooldown};
use crate::pages::field;

#[component]
pub fn SignIn() -> Element {
  let ctx = use_app();
  let mut auth = use_auth_session();
  let mut error = use_signal(|| None::<String>);
  let mut busy = use_signal(|| false);

  rsx! {
    section {
      class: "auth-card",
      h2 { "Sign in" }
      form {
        onsubmit: move |evt: FormEvent| {
          let ctx = ctx.clone();
          async move {
            let form = SignInForm { email: field(&evt, "email"), password: field(&evt, "password") };
            busy.set(true);
            let result = sign_in(ctx.api.as_ref(), &ctx.session, &form).await;
            busy.set(false);
            match result {
              Ok(dest) => {
                auth.sync(&ctx);
                navigator().push(Route::from(dest));
              }
              Err(e) => error.set(Some(e.user_message(ctx.config.locale))),
            }
          }
        },
        input { name: "email", r#type: "email", placeholder: "Email" }
        input { name: "password", r#type: "password", placeholder: "Password" }
        FormError { message: error() }
        button { r#type: "submit", disabled: busy(), "Sign in" }
      }
      Link { to: Route::ForgotPassword {}, "Forgot password?" }
      Link { to: Route::SignUp {}, "Create an account" }
    }
  }
}

#[component]
pub fn SignUp() -> Element {
  let ctx = use_app();
  let mut auth = use_auth_session();
  let init = ctx.clone();
  let mut flow = use_signal(move || SignupFlow::new(init.api.clone(), init.session.clone(), init.clock.clone(), init.config.locale));
  let mut busy = use_signal(|| false);

  let target = use_memo(move || {
    let f = flow.read();
    (f.step() == FlowStep::AwaitingOtp).then(|| f.cooldown().resend_available_at()).flatten()
  });
  let seconds = use_cooldown(target.into());

  // runs one async step on a copy of the flow, then stores the copy back
  let run = use_callback(move |step: SignupStep| {
    let ctx = ctx.clone();
    spawn(async move {
      let mut f = flow();
      busy.set(true);
      let outcome = match step {
        SignupStep::Details(details) => f.submit_details(details).await,
        SignupStep::Otp(code) => f.submit_otp(&code).await,
        SignupStep::Resend => f.resend().await,
      };
      busy.set(false);
      flow.set(f);
      if let Ok(FlowOutcome::Navigate(dest)) = outcome {
        auth.sync(&ctx);
        navigator().push(Route::from(dest));
      }
    });
  });

  let f = flow.read();
  let step = f.step();
  let error = f.error().map(str::to_string);
  let details = f.details().clone();
  drop(f);

  rsx! {
    section {
      class: "auth-card",
      h2 { "Create your account" }
      match step {
        FlowStep::Details => rsx! {
          form {
            onsubmit: move |evt: FormEvent| run.call(SignupStep::Details(SignupDetails {
              first_name: field(&evt, "first_name"),
              last_name: field(&evt, "last_name"),
              email: field(&evt, "email"),
              password: field(&evt, "password"),
              confirm_password: field(&evt, "confirm_password"),
            })),
            input { name: "first_name", placeholder: "First name", value: "{details.first_name}" }
            input { name: "last_name", placeholder: "Last name", value: "{details.last_name}" }
            input { name: "email", r#type: "email", placeholder: "Email", value: "{details.email}" }
            input { name: "password", r#type: "password", placeholder: "Password", value: "{details.password}" }
            input { name: "confirm_password", r#type: "password", placeholder: "Confirm password", value: "{details.confirm_password}" }
            FormError { message: error.clone() }
            button { r#type: "submit", disabled: busy(), "Send code" }
          }
        },
        _ => rsx! {
          form {
            onsubmit: move |evt: FormEvent| run.call(SignupStep::Otp(field(&evt, "otp"))),
            p { "We emailed a 6-digit code to {details.email}" }
            input { name: "otp", inputmode: "numeric", maxlength: "6", placeholder: "123456" }
            FormError { message: error.clone() }
            button { r#type: "submit", disabled: busy(), "Verify" }
          }
          button {
            disabled: busy() || seconds() > 0,
            onclick: move |_| run.call(SignupStep::Resend),
            if seconds() > 0 { "Resend code in {seconds}s" } else { "Resend code" }
          }
          button {
            class: "link-button",
            onclick: move |_| {
              let _ = flow.write().go_back();
            },
            "Back"
          }
        },
      }
      Link { to: Route::SignIn {}, "Already have an account? Sign in" }
    }
  }
}

enum SignupStep {
  Details(SignupDetails),
  Otp(String),
  Resend,
}

#[component]
pub fn ForgotPassword() -> Element {
  let ctx = use_app();
  let mut flow = use_signal(move || PasswordResetFlow::new(ctx.api.clone(), ctx.clock.clone(), ctx.config.locale));
  let mut busy = use_signal(|| false);
  let mut done = use_signal(|| false);

  let target = use_memo(move || {
    let f = flow.read();
    (f.step() == FlowStep::AwaitingOtp).then(|| f.cooldown().resend_available_at()).flatten()
  });
  let seconds = use_cooldown(target.into());

  let run = move |step: ResetStep| async move {
    let mut f = flow();
    busy.set(true);
    let outcome = match step {
      ResetStep::Email(email) => f.submit_details(&email).await,
      ResetStep::Otp(code) => f.submit_otp(&code),
      ResetStep::Password(pw, confirm) => f.submit_new_password(&pw, &confirm).await,
      ResetStep::Resend => f.resend().await,
    };
    busy.set(false);
    flow.set(f);
    if let Ok(FlowOutcome::Navigate(_)) = outcome {
      done.set(true);
    }
  };

  let f = flow.read();
  let step = f.step();
  let error = f.error().map(str::to_string);
  let email = f.email().to_string();
  drop(f);

  if done() {
    return rsx! {
      section {
        class: "auth-card",
        h2 { "Password updated" }
        Link { to: Route::SignIn {}, "Sign in with your new password" }
      }
    };
  }

  rsx! {
    section {
      class: "auth-card",
      h2 { "Reset your password" }
      match step {
        FlowStep::Details => rsx! {
          form {
            onsubmit: move |evt: FormEvent| run(ResetStep::Email(field(&evt, "email"))),
            input { name: "email", r#type: "email", placeholder: "Email", value: "{email}" }
            FormError { message: error.clone() }
            button { r#type: "submit", disabled: busy(), "Send code" }
          }
        },
        FlowStep::AwaitingOtp => rsx! {
          form {
            onsubmit: move |evt: FormEvent| run(ResetStep::Otp(field(&evt, "otp"))),
            p { "Enter the code we sent to {email}" }
            input { name: "otp", inputmode: "numeric", maxlength: "6" }
            FormError { message: error.clone() }
            button { r#type: "submit", "Continue" }
          }
          button {
            disabled: busy() || seconds() > 0,
            onclick: move |_| run(ResetStep::Resend),
            if seconds() > 0 { "Resend code in {seconds}s" } else { "Resend code" }
          }
        },
        FlowStep::ResettingPassword => rsx! {
          form {
            onsubmit: move |evt: FormEvent| run(ResetStep::Password(field(&evt, "password"), field(&evt, "confirm_password"))),
            input { name: "password", r#type: "password", placeholder: "New password" }
            input { name: "confirm_password", r#type: "password", placeholder: "Confirm new password" }
            FormError { message: error.clone() }
            button { r#type: "submit", disabled: busy(), "Update password" }
          }
        },
      }
      if step != FlowStep::Details {
        button {
          class: "link-button",
          onclick: move |_| {
            let _ = flow.write().go_back();
          },
          "Back"
        }
      }
    }
  }
}

enum ResetStep {
  Email(String),
  Otp(String),
  Password(String, String),
  Resend,
}
