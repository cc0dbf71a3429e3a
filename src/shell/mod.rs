//! Web shell: page routes behind the route guard plus the auth form
//! endpoints that manage the session cookie.

mod handlers;
pub mod pages;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Query,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::guard;
use pages::{Page, PageQuery};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Pool shared by every per-request API client.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = config.api_timeout() {
            builder = builder.timeout(t);
        }
        Ok(Self {
            config: Arc::new(config),
            http: builder.build()?,
        })
    }
}

fn shell(page: Page) -> MethodRouter<AppState> {
    get(move |q: Query<PageQuery>| handlers::page(page, q))
}

pub fn build_app(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(handlers::root))
        .route("/dashboard", shell(Page::Dashboard))
        .route("/transactions", shell(Page::Transactions))
        .route("/bills", shell(Page::Bills))
        .route("/goals", shell(Page::Goals))
        .route("/goals/history", shell(Page::GoalHistory))
        .route("/goals/add", shell(Page::AddGoal))
        .route("/goals/:id/edit", get(handlers::edit_goal))
        .route("/planning", shell(Page::Planning))
        .route("/statistics", shell(Page::Statistics))
        .route("/categories", shell(Page::Categories))
        .route("/settings", shell(Page::Settings))
        .route("/login", shell(Page::Login).post(handlers::login))
        .route("/register", shell(Page::Register).post(handlers::register))
        .route(
            "/forgot-password",
            shell(Page::ForgotPassword).post(handlers::forgot_password),
        )
        .route(
            "/reset-password",
            shell(Page::ResetPassword).post(handlers::reset_password),
        )
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::route_guard));

    Router::new()
        .merge(pages)
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().path().to_string();
                    tracing::info_span!("http_request", %method, %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(api = %config.api_base_url, "listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
