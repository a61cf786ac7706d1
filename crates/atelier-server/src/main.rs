use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use atelier_api::auth::{self, AppState, AppStateInner};
use atelier_api::middleware::require_auth;
use atelier_api::{friends, members, projects, reactions, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("ATELIER_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("ATELIER_DB_PATH").unwrap_or_else(|_| "atelier.db".into());
    let host = std::env::var("ATELIER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ATELIER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = atelier_db::Database::open(&PathBuf::from(&db_path))?;

    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/me", patch(users::update_me))
        .route("/users/{uid}", get(users::get_user))
        .route("/projects", post(projects::create_project))
        .route("/projects", get(projects::list_published))
        .route("/projects/{pid}", get(projects::get_project))
        .route("/projects/{pid}", put(projects::update_project))
        .route("/projects/{pid}", delete(projects::delete_project))
        .route("/projects/{pid}/members", post(members::add_member))
        .route("/projects/{pid}/members/{uid}", put(members::update_member))
        .route("/projects/{pid}/members/{uid}", delete(members::remove_member))
        .route("/projects/{pid}/petitions", post(members::petition))
        .route("/projects/{pid}/reactions", put(reactions::react))
        .route("/projects/{pid}/reactions", get(reactions::counts))
        .route("/friends", get(friends::list_friends))
        .route("/friends/requests", post(friends::send_request))
        .route("/friends/requests", get(friends::list_pending))
        .route(
            "/friends/requests/{requestor_uid}/accept",
            post(friends::accept_request),
        )
        .route(
            "/friends/requests/{requestor_uid}/reject",
            post(friends::reject_request),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Atelier server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
