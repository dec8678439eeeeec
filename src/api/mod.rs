use anyhow::{Context, Result};
use axum::{
    Extension, Router, middleware,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
pub mod identity;
mod openapi;
pub mod session;
pub(crate) mod soft_delete;

pub use openapi::openapi;

use identity::{IdentityConfig, IdentityProvider};

/// Build the application router.
///
/// Every route behind the main layer stack sees the request-scoped
/// [`session::AuthContext`]; `/health` sits outside it so health checks never
/// touch the identity provider.
pub fn router(
    pool: PgPool,
    provider: Arc<dyn IdentityProvider>,
    config: IdentityConfig,
) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    Router::new()
        .route("/", get(|| async { "🧪" }))
        .route(
            "/api/samples",
            get(handlers::samples::list_samples).post(handlers::samples::create_sample),
        )
        .route(
            "/api/samples/:id",
            get(handlers::samples::get_sample)
                .put(handlers::samples::update_sample)
                .delete(handlers::samples::delete_sample),
        )
        .route("/api/sessions/me", get(handlers::sessions::me))
        .route(
            "/api/auth/*path",
            get(handlers::auth::forward).post(handlers::auth::forward),
        )
        .route("/ui", get(handlers::ui::home))
        .route(
            "/ui/signin",
            get(handlers::ui::sign_in_page).post(handlers::ui::sign_in),
        )
        .route(
            "/ui/signup",
            get(handlers::ui::sign_up_page).post(handlers::ui::sign_up),
        )
        .route("/ui/signout", axum::routing::post(handlers::ui::sign_out))
        .route(
            "/ui/otp-signin",
            get(handlers::ui::otp_page).post(handlers::ui::otp_submit),
        )
        .merge(SwaggerUi::new("/api/ui").url("/api/doc", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(provider))
                .layer(Extension(config))
                .layer(Extension(pool.clone()))
                .layer(middleware::from_fn(session::resolve_session)),
        )
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .layer(Extension(pool))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    provider: Arc<dyn IdentityProvider>,
    config: IdentityConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let app = router(pool, provider, config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
