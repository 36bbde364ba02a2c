use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::services::Mailer;

/// Shared handles every handler receives
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            mailer,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(card_routes())
        .merge(organization_routes())
        .merge(connection_routes())
        .merge(collection_routes())
        .merge(favourite_routes())
        .merge(account_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // Layers run bottom-up: authenticate first, then check the role
    let admin = admin_routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected)
        // Admin API
        .merge(admin)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, cards};

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password/:token", put(auth::reset_password))
        .route("/api/cards/public/:id", get(cards::public_card))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", get(auth::logout))
        .route("/api/auth/details", put(auth::update_details))
        .route("/api/auth/password", put(auth::update_password))
}

fn card_routes() -> Router<AppState> {
    use protected::cards;

    Router::new()
        .route("/api/cards", get(cards::list).post(cards::create))
        .route("/api/cards/:id", get(cards::show).put(cards::update).delete(cards::remove))
}

fn organization_routes() -> Router<AppState> {
    use protected::organizations;

    Router::new()
        .route("/api/organizations", get(organizations::list).post(organizations::create))
        .route(
            "/api/organizations/:id",
            get(organizations::show)
                .put(organizations::update)
                .delete(organizations::remove),
        )
}

fn connection_routes() -> Router<AppState> {
    use protected::connections;

    Router::new()
        .route("/api/connections", get(connections::list).post(connections::create))
        .route("/api/connections/incoming", get(connections::incoming))
        .route(
            "/api/connections/:id",
            get(connections::show)
                .put(connections::update)
                .delete(connections::remove),
        )
}

fn collection_routes() -> Router<AppState> {
    use protected::collections;

    Router::new()
        .route("/api/collections", get(collections::list).post(collections::create))
        .route(
            "/api/collections/:id",
            get(collections::show)
                .put(collections::update)
                .delete(collections::remove),
        )
        .route(
            "/api/collections/:id/cards/:card_id",
            put(collections::add_card).delete(collections::remove_card),
        )
}

fn favourite_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::favourites;

    Router::new()
        .route("/api/favourites", get(favourites::list).post(favourites::create))
        .route("/api/favourites/:id", delete(favourites::remove))
}

fn account_routes() -> Router<AppState> {
    use protected::{activities, settings};

    Router::new()
        .route("/api/activities", get(activities::list))
        .route("/api/settings", get(settings::show).put(settings::update))
}

fn admin_routes() -> Router<AppState> {
    use elevated::{stats, users};

    Router::new()
        .route("/api/admin/stats", get(stats::stats))
        .route("/api/admin/users", get(users::list).post(users::create))
        .route(
            "/api/admin/users/:id",
            get(users::show).put(users::update).delete(users::remove),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Cardstack API",
            "version": version,
            "description": "Digital business card platform",
            "endpoints": {
                "auth": "/api/auth/* (register, login and password reset are public)",
                "public_cards": "/api/cards/public/:id (public)",
                "cards": "/api/cards[/:id] (protected)",
                "organizations": "/api/organizations[/:id] (protected)",
                "connections": "/api/connections[/:id|/incoming] (protected)",
                "collections": "/api/collections[/:id[/cards/:card_id]] (protected)",
                "favourites": "/api/favourites[/:id] (protected)",
                "activities": "/api/activities (protected)",
                "settings": "/api/settings (protected)",
                "admin": "/api/admin/stats, /api/admin/users[/:id] (admin)",
            },
            "listing": {
                "select": "comma-separated fields",
                "sort": "comma-separated fields, '-' prefix for descending",
                "page": "1-indexed page, default 1",
                "limit": "page size, default 25",
                "filters": "field=value or field[gt|gte|lt|lte|in]=value",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": state.store.backend()
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
