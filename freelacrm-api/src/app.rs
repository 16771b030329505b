/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use freelacrm_api::{app::{build_router, AppState}, config::Config};
/// use freelacrm_shared::{notify::LogMailer, store::MemoryStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let mailer = Arc::new(LogMailer::new(&config.mail.from, &config.mail.reset_url_base));
/// let state = AppState::new(Arc::new(MemoryStore::new()), mailer, config);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use chrono::Duration;
use freelacrm_shared::{
    auth::{jwt::TokenCodec, middleware::authenticate},
    notify::Mailer,
    services::Services,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,

    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services over `store` using the token settings in `config`
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let codec = TokenCodec::new(&config.jwt.secret, Duration::hours(config.jwt.ttl_hours));

        Self {
            services: Services::new(store, codec, mailer),
            config: Arc::new(config),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        self.services.sessions.codec()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                                  public
/// /api/v1/health                           public
/// /api/v1/auth/
///     POST register | login | refresh
///     POST password/forgot | password/validate | password/reset
/// /api/v1/user/profile                     GET
/// /api/v1/clients                          GET POST
///     /:id                                 GET PUT DELETE
///     /:id/tasks | /:id/payments           GET
/// /api/v1/tasks                            GET POST
///     /upcoming                            GET
///     /:id                                 GET PUT DELETE
///     /:id/status                          PATCH
/// /api/v1/payments                         GET POST
///     /overdue                             GET
///     /overdue/refresh                     POST
///     /summary                             GET
///     /task/:task_id                       GET
///     /:id                                 GET PUT DELETE
///     /:id/pay                             POST
/// ```
///
/// Everything below `/user`, `/clients`, `/tasks` and `/payments` requires a
/// bearer token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/password/forgot", post(routes::auth::forgot_password))
        .route("/password/validate", post(routes::auth::validate_reset_token))
        .route("/password/reset", post(routes::auth::reset_password));

    let client_routes = Router::new()
        .route(
            "/",
            get(routes::clients::list_clients).post(routes::clients::create_client),
        )
        .route(
            "/:id",
            get(routes::clients::get_client)
                .put(routes::clients::update_client)
                .delete(routes::clients::delete_client),
        )
        .route("/:id/tasks", get(routes::tasks::list_client_tasks))
        .route("/:id/payments", get(routes::payments::list_client_payments));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/upcoming", get(routes::tasks::upcoming_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", patch(routes::tasks::change_task_status));

    let payment_routes = Router::new()
        .route(
            "/",
            get(routes::payments::list_payments).post(routes::payments::create_payment),
        )
        .route("/overdue", get(routes::payments::overdue_payments))
        .route("/overdue/refresh", post(routes::payments::refresh_overdue))
        .route("/summary", get(routes::payments::payment_summary))
        .route("/task/:task_id", get(routes::payments::list_task_payments))
        .route(
            "/:id",
            get(routes::payments::get_payment)
                .put(routes::payments::update_payment)
                .delete(routes::payments::delete_payment),
        )
        .route("/:id/pay", post(routes::payments::mark_payment_paid));

    let protected_routes = Router::new()
        .route("/user/profile", get(routes::users::profile))
        .nest("/clients", client_routes)
        .nest("/tasks", task_routes)
        .nest("/payments", payment_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .merge(health_routes.clone())
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Verifies the session token and puts an `AuthContext` into the request
/// extensions for the handlers below it.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(state.codec(), req.headers())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
