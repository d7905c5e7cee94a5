//! Admin authentication, delegated to an external identity provider.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::app::error::AppError;

pub mod session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdminUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AdminUser,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider answered and said no.
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(reason) => AppError::Unauthorized(reason),
            AuthError::Unreachable(_) => AppError::ServiceUnreachable("IdentityProvider".into()),
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credentials, AuthError>> + Send;

    /// `Ok(None)` when the token is expired or unknown.
    fn current_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Option<AdminUser>, AuthError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}
