use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::IdentityProvider;
use crate::config::{self, AppConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }
}

/// Full application router with global middleware
pub fn app(state: AppState) -> Router {
    app_with_config(state, config::config())
}

/// Router built against an explicit configuration
pub fn app_with_config(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .merge(chat_routes())
        .merge(note_routes())
        .merge(section_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(config));
    }

    // The request span is always present so handler logs carry method and uri;
    // the flag only controls the per-response event.
    let response_level = if config.api.enable_request_logging { Level::INFO } else { Level::DEBUG };
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(response_level)),
    )
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
}

fn chat_routes() -> Router<AppState> {
    use protected::chat::{conversations, messages};

    Router::new()
        .route("/chat", get(conversations::list).post(conversations::create))
        .route(
            "/chat/:id",
            get(conversations::get)
                .patch(conversations::update)
                .delete(conversations::delete),
        )
        .route("/chat/:id/unarchive", post(conversations::unarchive))
        // Messages are immutable: no update or delete
        .route("/chat/:id/messages", get(messages::list).post(messages::create))
        .route("/chat/:id/messages/count", get(messages::count))
}

fn note_routes() -> Router<AppState> {
    use protected::notes;

    Router::new()
        .route("/notes", get(notes::list).post(notes::create))
        .route("/notes/:id", get(notes::get).patch(notes::update).delete(notes::delete))
        .route("/notes/:id/restore", post(notes::restore))
}

fn section_routes() -> Router<AppState> {
    use protected::sections;

    Router::new()
        .route("/sections", get(sections::list).post(sections::create))
        .route("/sections/reorder", post(sections::reorder))
        .route(
            "/sections/:id",
            get(sections::get).patch(sections::update).delete(sections::delete),
        )
        .route("/sections/:id/pages", get(sections::pages))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins).allow_credentials(true)
    }
}
