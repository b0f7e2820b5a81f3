use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::{info, warn};

use super::server::{AppError, User};

/// The only client-side value that outlives a page load.
pub const SESSION_TOKEN_KEY: &str = "propdesk.session_token";

/// Durable home for the session token.
pub trait SessionStorage: Send + Sync {
  fn load(&self) -> Result<Option<String>, AppError>;
  fn save(&self, token: &str) -> Result<(), AppError>;
  fn clear(&self) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
  slot: Mutex<Option<String>>,
}

impl MemoryStorage {
  pub fn with_token(token: &str) -> Self {
    Self { slot: Mutex::new(Some(token.to_string())) }
  }
}

impl SessionStorage for MemoryStorage {
  fn load(&self) -> Result<Option<String>, AppError> {
    Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
  }

  fn save(&self, token: &str) -> Result<(), AppError> {
    *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    Ok(())
  }

  fn clear(&self) -> Result<(), AppError> {
    *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    Ok(())
  }
}

impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
  fn load(&self) -> Result<Option<String>, AppError> {
    (**self).load()
  }

  fn save(&self, token: &str) -> Result<(), AppError> {
    (**self).save(token)
  }

  fn clear(&self) -> Result<(), AppError> {
    (**self).clear()
  }
}

/// `window.localStorage`, looked up on every call so nothing JS-owned is held.
#[cfg(feature = "web")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

#[cfg(feature = "web")]
impl LocalStorage {
  fn storage() -> Result<web_sys::Storage, AppError> {
    web_sys::window()
      .ok_or_else(|| AppError::Storage("no global window".to_string()))?
      .local_storage()
      .map_err(|e| AppError::Storage(format!("{:?}", e)))?
      .ok_or_else(|| AppError::Storage("localStorage unavailable".to_string()))
  }
}

#[cfg(feature = "web")]
impl SessionStorage for LocalStorage {
  fn load(&self) -> Result<Option<String>, AppError> {
    Self::storage()?.get_item(SESSION_TOKEN_KEY).map_err(|e| AppError::Storage(format!("{:?}", e)))
  }

  fn save(&self, token: &str) -> Result<(), AppError> {
    Self::storage()?.set_item(SESSION_TOKEN_KEY, token).map_err(|e| AppError::Storage(format!("{:?}", e)))
  }

  fn clear(&self) -> Result<(), AppError> {
    Self::storage()?.remove_item(SESSION_TOKEN_KEY).map_err(|e| AppError::Storage(format!("{:?}", e)))
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
  pub token: Option<String>,
  pub user: Option<User>,
}

/// Process-wide auth state.
///
/// Lifecycle: [`AuthSession::init`] hydrates the token from storage once at
/// startup, [`AuthSession::sign_in`] persists a freshly issued token, and
/// [`AuthSession::teardown`] wipes storage and memory on logout or a 401.
/// Every change bumps a revision that [`AuthSession::subscribe`] watchers see.
pub struct AuthSession {
  storage: Box<dyn SessionStorage>,
  state: RwLock<SessionState>,
  revision: watch::Sender<u64>,
}

impl AuthSession {
  pub fn init(storage: impl SessionStorage + 'static) -> Arc<Self> {
    let token = match storage.load() {
      Ok(token) => token,
      Err(e) => {
        warn!("could not hydrate session token: {}", e);
        None
      }
    };
    if token.is_some() {
      info!("session token hydrated from storage");
    }
    Arc::new(Self {
      storage: Box::new(storage),
      state: RwLock::new(SessionState { token, user: None }),
      revision: watch::Sender::new(0),
    })
  }

  /// Wakes on every sign-in, profile change and teardown.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.revision.subscribe()
  }

  pub fn revision(&self) -> u64 {
    *self.revision.borrow()
  }

  fn bump(&self) {
    self.revision.send_modify(|rev| *rev += 1);
  }

  fn read(&self) -> RwLockReadGuard<'_, SessionState> {
    self.state.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
    self.state.write().unwrap_or_else(PoisonError::into_inner)
  }

  /// Persists the token first; memory is only updated once storage accepted it.
  pub fn sign_in(&self, token: String, user: User) -> Result<(), AppError> {
    self.storage.save(&token)?;
    {
      let mut state = self.write();
      state.token = Some(token);
      state.user = Some(user);
    }
    self.bump();
    info!("session started");
    Ok(())
  }

  /// Attaches the profile for a token that was hydrated without one.
  pub fn set_user(&self, user: User) {
    self.write().user = Some(user);
    self.bump();
  }

  pub fn teardown(&self) {
    if let Err(e) = self.storage.clear() {
      warn!("failed to clear stored session token: {}", e);
    }
    *self.write() = SessionState::default();
    self.bump();
    info!("session torn down");
  }

  pub fn token(&self) -> Option<String> {
    self.read().token.clone()
  }

  pub fn user(&self) -> Option<User> {
    self.read().user.clone()
  }

  pub fn user_id(&self) -> Option<String> {
    self.read().user.as_ref().map(|u| u.id.clone())
  }

  pub fn is_authenticated(&self) -> bool {
    self.read().token.is_some()
  }

  pub fn snapshot(&self) -> SessionState {
    self.read().clone()
  }
}
