//! HTTP routes
//!
//! Public routes issue and inspect tokens; the routes nested behind
//! [`gate::require_token`] only run for requests carrying a valid token.

use std::sync::Arc;

use auth::ClaimSet;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use error::AuthError;
use serde::{Deserialize, Serialize};
use token_service::{PublicAccount, TokenInfo, TokenService};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::gate;
use crate::response::{error_response, ApiError};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    /// Whether the seeded demo credentials should be advertised on `/`
    pub demo_accounts: bool,
}

impl AppState {
    pub fn new(tokens: TokenService, demo_accounts: bool) -> Self {
        Self {
            tokens: Arc::new(tokens),
            demo_accounts,
        }
    }
}

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    let gated = Router::new()
        .route("/api/verify", get(verify))
        .route("/api/profile", get(profile))
        .route("/api/protected", get(protected))
        .route("/api/refresh", post(refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_token,
        ));

    Router::new()
        .route("/", get(index))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/decode-token", get(decode_token))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: &'static str,
    user: PublicAccount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    message: &'static str,
    token: String,
    user: PublicAccount,
    token_info: TokenInfo,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    message: &'static str,
    token: String,
}

#[derive(Debug, Serialize)]
struct ClaimsResponse {
    message: &'static str,
    user: ClaimSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProtectedData {
    secret_info: &'static str,
    timestamp: String,
    user: ClaimSet,
}

#[derive(Debug, Serialize)]
struct ProtectedResponse {
    message: &'static str,
    data: ProtectedData,
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = serde_json::json!({
        "message": "JWT Authentication API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/register": "Register a new user",
            "POST /api/login": "Login and get JWT token",
            "GET /api/verify": "Verify JWT token",
            "GET /api/profile": "Get user profile (protected)",
            "GET /api/protected": "Access protected resource",
            "POST /api/refresh": "Refresh JWT token",
            "GET /api/decode-token": "Decode and analyze JWT token"
        }
    });
    if state.demo_accounts {
        body["credentials"] = serde_json::json!({
            "username": "demo or admin",
            "password": token_service::repository::DEMO_PASSWORD
        });
    }
    Json(body)
}

/// Unwrap a JSON body, answering unreadable bodies with the same JSON error
/// shape as every other failure.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::from(AuthError::MissingField("body")))
        }
    }
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    let user = state
        .tokens
        .register(&req.username, &req.password, &req.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let req = json_body(body)?;
    let issued = state.tokens.issue(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful",
        token: issued.token.token,
        user: issued.account,
        token_info: issued.token_info,
    }))
}

async fn verify(Extension(claims): Extension<ClaimSet>) -> Json<ClaimsResponse> {
    Json(ClaimsResponse {
        message: "Token is valid",
        user: claims,
    })
}

async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
) -> Result<Json<PublicAccount>, ApiError> {
    Ok(Json(state.tokens.profile(&claims).await?))
}

async fn protected(Extension(claims): Extension<ClaimSet>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "This is protected data",
        data: ProtectedData {
            secret_info: "You can only see this with a valid JWT token!",
            timestamp: chrono::Utc::now().to_rfc3339(),
            user: claims,
        },
    })
}

async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
) -> Result<Json<TokenResponse>, ApiError> {
    let refreshed = state.tokens.refresh(&claims)?;

    Ok(Json(TokenResponse {
        message: "Token refreshed successfully",
        token: refreshed.token,
    }))
}

/// Not gated: explains any token, valid or not.
async fn decode_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = gate::bearer_token(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "TOKEN_REQUIRED", "Token required");
    };

    let report = state.tokens.diagnose(token);
    if !report.is_decodable() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "TOKEN_INVALID_FORMAT",
            "Invalid token format",
        );
    }

    Json(report).into_response()
}
