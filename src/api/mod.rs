/// HTTP layer: routes, shared state and error mapping
///
/// Handlers are thin adapters over `HabitService`. Which completion routes
/// exist depends on the configured completion mode.

pub mod complete;
pub mod error;
pub mod habits;
pub mod uploads;

pub use error::{parse_habit_id, ApiError, ErrorBody};

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{
            AUTHORIZATION, CONTENT_SECURITY_POLICY, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::domain::CompletionMode;
use crate::service::HabitService;
use crate::storage::{images::PUBLIC_PREFIX, HabitStorage};

/// Room for multipart boundaries and headers on top of the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Content-Security-Policy sent with every response
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
script-src 'self' 'unsafe-inline' https://vercel.live; \
connect-src 'self' https://vercel.live";

/// State shared by every handler
pub struct AppState<S: HabitStorage> {
    pub service: HabitService<S>,
    pub mode: CompletionMode,
}

impl<S: HabitStorage> AppState<S> {
    pub fn new(service: HabitService<S>, mode: CompletionMode) -> Self {
        Self { service, mode }
    }
}

/// Build the application router for the given state
pub fn router<S: HabitStorage + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let body_limit = state.service.images().max_bytes() + MULTIPART_OVERHEAD;

    let mut app: Router<Arc<AppState<S>>> = Router::new()
        .route("/", get(welcome))
        .route(
            "/habits",
            get(habits::list_habits::<S>).post(habits::create_habit::<S>),
        )
        .route(
            "/habits/:id",
            get(habits::get_habit::<S>)
                .put(habits::update_habit::<S>)
                .patch(habits::update_habit::<S>)
                .delete(habits::delete_habit::<S>),
        );

    app = match state.mode {
        CompletionMode::Upload => app
            .route(
                "/habits/:id/upload",
                post(uploads::upload_photo::<S>).delete(uploads::delete_today_upload::<S>),
            )
            .nest_service(PUBLIC_PREFIX, ServeDir::new(state.service.images().root())),
        CompletionMode::Toggle => app.route(
            "/habits/:id/complete",
            patch(complete::toggle_completion::<S>),
        ),
    };

    tracing::info!("Routes configured for {} completion mode", state.mode.display_name());

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to the Habit Tracker API!"
}
