//! Pluto Web Server
//!
//! Axum-based REST API for the Pluto personal finance backend.
//!
//! Security features:
//! - HS256 bearer tokens on every route except signup, login and health
//! - Restrictive CORS policy
//! - Input validation (pagination limits, analysis windows, ids and dates)
//! - Audit logging for authenticated API access
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use pluto_core::ai::{AIBackend, AIClient};
use pluto_core::db::Database;
use pluto_core::narrative::NarrativeInsightService;
use pluto_core::synth;

mod handlers;
pub mod token;

pub use token::JwtConfig;

/// Maximum accepted JSON request body (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Origins allowed when `CORS_ORIGINS` is unset
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    pub jwt: JwtConfig,
    /// Base seed for synthetic account histories
    pub synth_seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            jwt: JwtConfig::default(),
            synth_seed: synth::DEFAULT_SEED,
        }
    }
}

impl ServerConfig {
    /// Read `CORS_ORIGINS`, the JWT settings and `PLUTO_SYNTH_SEED`
    pub fn from_env() -> Self {
        let origins =
            std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string());
        Self {
            allowed_origins: parse_origins(&origins),
            jwt: JwtConfig::from_env(),
            synth_seed: synth::base_seed_from_env(),
        }
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub insights: NarrativeInsightService,
}

/// The authenticated caller, inserted into request extensions by the auth layer
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
}

/// Authentication middleware - validates the bearer token and loads the user
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "Unauthorized request - no bearer token");
        return AppError::unauthorized("Not authenticated").into_response();
    };

    let Some(user_id) = token::verify_token(&state.config.jwt, token) else {
        warn!(path = %request.uri().path(), "Rejected invalid token");
        return AppError::unauthorized("Invalid token").into_response();
    };

    let user = match state.db.get_user(user_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(user_id, "Token subject no longer exists");
            return AppError::unauthorized("Invalid token").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
    });
    next.run(request).await
}

/// Create the application router, configuring AI from the environment
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        info!(
            "AI backend configured: {} at {} (model: {})",
            client.backend_name(),
            client.host(),
            client.model()
        );
    } else {
        info!("ℹ️  AI backend not configured (set GEMINI_API_KEY to enable narrative insights)");
    }
    create_router_with_ai(db, static_dir, config, ai)
}

/// Create the application router with an explicit AI client (for testing)
pub fn create_router_with_ai(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    ai: Option<AIClient>,
) -> Router {
    let state = Arc::new(AppState {
        insights: NarrativeInsightService::new(db.clone(), ai),
        db,
        config: config.clone(),
    });

    let public_routes = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        // Users
        .route("/users/me", get(handlers::get_me))
        // Accounts
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/accounts/link", post(handlers::link_account))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        // Analytics
        .route(
            "/insights/spending-summary",
            get(handlers::spending_summary),
        )
        .route("/insights/trends", get(handlers::spending_trends))
        .route("/insights/pluto-score", get(handlers::pluto_score))
        .route(
            "/insights/financial-summary",
            get(handlers::financial_summary),
        )
        // Narrative insights
        .route("/insights/ai", get(handlers::ai_insights))
        // Plaid-shaped views of linked accounts
        .route(
            "/fake/plaid/transactions",
            get(handlers::fake_plaid_transactions),
        )
        .route(
            "/accounts/plaid/transactions/get",
            post(handlers::plaid_transactions_get),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Build CORS layer
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.jwt.secret == token::DEFAULT_JWT_SECRET {
        warn!("⚠️  Using the default JWT secret - set JWT_SECRET before exposing this server");
    }

    check_ai_connection().await;

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured, narrative insights will use the fallback");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    /// Map client-facing core errors to their status; everything else is a 500
    pub fn from_core(err: pluto_core::Error) -> Self {
        use pluto_core::Error;

        match err {
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::Conflict(msg) => Self::conflict(&msg),
            Error::Auth(msg) => Self::unauthorized(&msg),
            other => Self::from(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}
