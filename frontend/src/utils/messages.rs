use super::server::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
  #[default]
  En,
  Es,
}

impl Locale {
  /// Parses a BCP-47 tag loosely, e.g. `es-MX` -> `Es`. Anything unknown is English.
  pub fn from_tag(tag: &str) -> Self {
    match tag.split(['-', '_']).next().map(|s| s.to_ascii_lowercase()) {
      Some(lang) if lang == "es" => Locale::Es,
      _ => Locale::En,
    }
  }
}

pub fn generic_failure(locale: Locale) -> &'static str {
  match locale {
    Locale::En => "Something went wrong. Please try again.",
    Locale::Es => "Algo salió mal. Inténtalo de nuevo.",
  }
}

pub fn session_expired(locale: Locale) -> &'static str {
  match locale {
    Locale::En => "Your session has expired. Please sign in again.",
    Locale::Es => "Tu sesión ha expirado. Inicia sesión de nuevo.",
  }
}

pub fn validation_message(err: &ValidationError, locale: Locale) -> String {
  match (err, locale) {
    (ValidationError::PasswordMismatch, Locale::En) => "Passwords do not match".into(),
    (ValidationError::PasswordMismatch, Locale::Es) => "Las contraseñas no coinciden".into(),
    (ValidationError::PasswordTooShort { min }, Locale::En) => format!("Password must be at least {} characters", min),
    (ValidationError::PasswordTooShort { min }, Locale::Es) => format!("La contraseña debe tener al menos {} caracteres", min),
    (ValidationError::InvalidOtpLength { expected }, Locale::En) => format!("Enter the {}-digit code we emailed you", expected),
    (ValidationError::InvalidOtpLength { expected }, Locale::Es) => format!("Introduce el código de {} dígitos que te enviamos", expected),
    (ValidationError::MissingEmail, Locale::En) => "Email is required".into(),
    (ValidationError::MissingEmail, Locale::Es) => "El correo es obligatorio".into(),
    (ValidationError::CooldownActive { seconds }, Locale::En) => format!("You can request a new code in {}s", seconds),
    (ValidationError::CooldownActive { seconds }, Locale::Es) => format!("Puedes pedir un nuevo código en {}s", seconds),
    (ValidationError::InvalidTransition { .. }, Locale::En) => "This step is not available right now".into(),
    (ValidationError::InvalidTransition { .. }, Locale::Es) => "Este paso no está disponible ahora".into(),
  }
}
