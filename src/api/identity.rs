use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    app::config::IdentityConfig,
    auth::{AdminUser, AuthError, Credentials, IdentityProvider},
};

const DEFAULT_REJECTION: &str = "Invalid login credentials";

/// Client for a GoTrue-compatible identity service.
pub struct GoTrueClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenRes {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: UserRes,
}

#[derive(Deserialize)]
struct UserRes {
    id: String,
    email: Option<String>,
}

impl From<UserRes> for AdminUser {
    fn from(user: UserRes) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorRes {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

impl ErrorRes {
    fn reason(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.error)
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string())
    }
}

fn unreachable(err: reqwest::Error) -> AuthError {
    AuthError::Unreachable(err.to_string())
}

impl GoTrueClient {
    pub fn new(http: Client, config: &IdentityConfig) -> Self {
        Self {
            http,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl IdentityProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, AuthError> {
        let res = self
            .http
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(unreachable)?;

        let status = res.status();
        if status.is_server_error() {
            return Err(AuthError::Unreachable(format!("identity service answered {}", status)));
        }
        if !status.is_success() {
            let body: ErrorRes = res.json().await.unwrap_or_default();
            return Err(AuthError::Rejected(body.reason()));
        }

        let token: TokenRes = res.json().await.map_err(unreachable)?;
        Ok(Credentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user.into(),
        })
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AdminUser>, AuthError> {
        let res = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unreachable)?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user: UserRes = res.json().await.map_err(unreachable)?;
                Ok(Some(user.into()))
            }
            status if status.is_server_error() => Err(AuthError::Unreachable(format!(
                "identity service answered {}",
                status
            ))),
            _ => {
                let body: ErrorRes = res.json().await.unwrap_or_default();
                Err(AuthError::Rejected(body.reason()))
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let res = self
            .http
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unreachable)?;

        // An already expired token is as good as signed out.
        if res.status().is_success() || res.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(AuthError::Rejected(format!(
                "Sign-out rejected with {}",
                res.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reason_prefers_the_most_specific_field() {
        let body: ErrorRes = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        )
        .unwrap();
        assert_eq!(body.reason(), "Email not confirmed");

        let body: ErrorRes = serde_json::from_str(r#"{"msg":"User banned"}"#).unwrap();
        assert_eq!(body.reason(), "User banned");

        assert_eq!(ErrorRes::default().reason(), DEFAULT_REJECTION);
    }

    #[test]
    fn builds_endpoint_urls_from_the_configured_base() {
        let client = GoTrueClient::new(
            Client::new(),
            &IdentityConfig {
                url: "http://auth.local/auth/v1".into(),
                api_key: "anon".into(),
            },
        );
        assert_eq!(client.url("token"), "http://auth.local/auth/v1/token");
    }

    #[tokio::test]
    async fn unreachable_service_is_reported_as_such() {
        let client = GoTrueClient::new(
            Client::new(),
            &IdentityConfig {
                url: "http://127.0.0.1:1".into(),
                api_key: String::new(),
            },
        );
        assert!(matches!(
            client.current_user("token").await,
            Err(AuthError::Unreachable(_))
        ));
    }
}
