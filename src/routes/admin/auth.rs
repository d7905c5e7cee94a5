use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, FieldError, StdResponse},
        middleware::AccessToken,
        state::AppState,
    },
    auth::{AdminUser, Credentials, IdentityProvider},
};

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(login))
}

pub fn protected_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(logout))
        .routes(utoipa_axum::routes!(me))
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    pub email: String,
    pub password: String,
}

impl LoginReq {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Exchange admin credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Admin"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Signed in successfully", body = StdResponse<Credentials, String>),
        (status = 401, description = "Credentials rejected"),
        (status = 503, description = "Identity provider unreachable")
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let credentials = state
        .identity
        .sign_in(body.email.trim(), &body.password)
        .await?;
    tracing::info!("Admin {} signed in", credentials.user.id);

    Ok(StdResponse {
        data: Some(credentials),
        message: Some("Signed in successfully"),
    })
}

/// Revoke the bearer token used for this request.
#[utoipa::path(
    post,
    path = "/logout",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Signed out successfully", body = StdResponse<AdminUser, String>)
    )
)]
async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AdminUser>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<impl IntoResponse, AppError> {
    state.identity.sign_out(&token).await?;
    tracing::info!("Admin {} signed out", user.id);

    Ok(StdResponse {
        data: Some(user),
        message: Some("Signed out successfully"),
    })
}

/// The admin the bearer token belongs to.
#[utoipa::path(
    get,
    path = "/me",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get admin successfully", body = StdResponse<AdminUser, String>)
    )
)]
async fn me(Extension(user): Extension<AdminUser>) -> Result<impl IntoResponse, AppError> {
    Ok(StdResponse {
        data: Some(user),
        message: Some("Get admin successfully"),
    })
}
