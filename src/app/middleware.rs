use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    app::{error::AppError, state::AppState},
    auth::{AuthError, IdentityProvider},
};

/// Bearer token of the admin making the request, kept for sign-out.
#[derive(Clone, Debug)]
pub struct AccessToken(pub String);

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Admits the request only when the identity provider recognises its bearer token.
pub async fn admin_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    let user = match state.identity.current_user(&token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::Unauthorized("Session expired or invalid".into())),
        Err(AuthError::Rejected(reason)) => return Err(AppError::Unauthorized(reason)),
        Err(AuthError::Unreachable(_)) => {
            return Err(AppError::ServiceUnreachable("IdentityProvider".into()));
        }
    };

    tracing::debug!("Admin {} authorized", user.id);
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(AccessToken(token));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(
            bearer_token(&request_with("Bearer abc.def")),
            Some("abc.def".to_string())
        );
        assert_eq!(bearer_token(&request_with("Basic abc")), None);
        assert_eq!(bearer_token(&request_with("Bearer   ")), None);
        assert_eq!(
            bearer_token(&Request::builder().body(Body::empty()).unwrap()),
            None
        );
    }
}
