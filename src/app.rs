use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, Environment, SecurityConfig};
use crate::database::MemberStoreHandle;
use crate::handlers::{members, system};
use crate::middleware::{rate_limit, RateLimiter};
use crate::services::MemberService;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: MemberStoreHandle,
    pub members: MemberService,
}

impl AppState {
    pub fn new(config: AppConfig, store: MemberStoreHandle) -> Self {
        let members = MemberService::new(store.clone(), config.pagination.clone());
        Self {
            config: Arc::new(config),
            store,
            members,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(state.config.environment, &state.config.security);

    let mut app = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api/setting/members", member_routes())
        .fallback(system::not_found);

    if state.config.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::new(&state.config.rate_limit));
        app = app.layer(from_fn_with_state(limiter, rate_limit));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(body_limit)),
    )
    .with_state(state)
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(members::member_list).post(members::member_create))
        .route("/load-more", get(members::member_load_more))
        .route(
            "/:id",
            get(members::member_get)
                .put(members::member_update)
                .delete(members::member_delete),
        )
}

/// Listed origins only. With none configured, development allows any origin and
/// other environments allow none.
fn cors_layer(environment: Environment, security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return match environment {
            Environment::Development => CorsLayer::permissive(),
            _ => CorsLayer::new(),
        };
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
