use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::{AdminUser, AuthError, IdentityProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A session check is in flight.
    Loading,
    SignedOut,
    SignedIn {
        user: AdminUser,
        access_token: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(AdminUser),
    SignedOut,
}

struct Inner<P> {
    provider: Arc<P>,
    state: watch::Sender<SessionState>,
}

/// Shared admin session. Clones refer to the same session; changes are pushed
/// to every live [`SessionSubscription`].
pub struct SessionHandle<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for SessionHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: IdentityProvider> SessionHandle<P> {
    /// Starts in [`SessionState::Loading`] until [`restore`](Self::restore) or a login settles it.
    pub fn new(provider: Arc<P>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            inner: Arc::new(Inner { provider, state }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::SignedIn { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Loading)
    }

    pub fn user(&self) -> Option<AdminUser> {
        match &*self.inner.state.borrow() {
            SessionState::SignedIn { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        match &*self.inner.state.borrow() {
            SessionState::SignedIn { access_token, .. } => Some(access_token.clone()),
            _ => None,
        }
    }

    /// Checks a previously issued token with the provider. Any failure leaves the session signed out.
    pub async fn restore(&self, access_token: Option<&str>) {
        let Some(access_token) = access_token else {
            self.set(SessionState::SignedOut);
            return;
        };

        self.set(SessionState::Loading);
        let next = match self.inner.provider.current_user(access_token).await {
            Ok(Some(user)) => SessionState::SignedIn {
                user,
                access_token: access_token.to_string(),
            },
            Ok(None) => SessionState::SignedOut,
            Err(err) => {
                tracing::error!("Auth check error: {}", err);
                SessionState::SignedOut
            }
        };
        self.set(next);
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = self.inner.provider.sign_in(email, password).await?;
        tracing::info!("Admin {} signed in", credentials.user.id);
        self.set(SessionState::SignedIn {
            user: credentials.user,
            access_token: credentials.access_token,
        });
        Ok(())
    }

    /// Always ends signed out, even if the provider could not be told.
    pub async fn logout(&self) {
        if let Some(access_token) = self.access_token() {
            if let Err(err) = self.inner.provider.sign_out(&access_token).await {
                tracing::warn!("Provider sign-out failed: {}", err);
            }
        }
        self.set(SessionState::SignedOut);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.inner.state.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.receiver_count()
    }

    fn set(&self, state: SessionState) {
        self.inner.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

/// Receives sign-in and sign-out notifications. Dropping it unsubscribes.
pub struct SessionSubscription {
    receiver: watch::Receiver<SessionState>,
}

impl SessionSubscription {
    /// Waits for the next settled change. Rapid successive changes coalesce into the latest one.
    /// Returns `None` once the session handle is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            self.receiver.changed().await.ok()?;
            match &*self.receiver.borrow_and_update() {
                SessionState::SignedIn { user, .. } => {
                    return Some(SessionEvent::SignedIn(user.clone()));
                }
                SessionState::SignedOut => return Some(SessionEvent::SignedOut),
                SessionState::Loading => continue,
            }
        }
    }
}
