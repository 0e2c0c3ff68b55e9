use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::auth::auth_middleware;
use crate::config::Config;
use crate::db::DbPool;
use crate::handlers::{
    auth as auth_handlers, calls as call_handlers, connections as connection_handlers,
    messages as message_handlers, posts as post_handlers, profiles as profile_handlers,
    ringtones as ringtone_handlers,
};
use crate::media::MediaStore;
use crate::signaling::SignalingHub;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub media: MediaStore,
    pub hub: Arc<SignalingHub>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let media = MediaStore::new(config.media_root.clone(), &config.public_base_url);
        Self {
            db,
            config,
            media,
            hub: Arc::new(SignalingHub::new()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let media_root = state.config.media_root.clone();
    let body_limit = state.config.max_upload_bytes;

    // Public auth routes (no middleware)
    let public_auth_routes = Router::new()
        .route("/signup", post(auth_handlers::signup))
        .route("/login", post(auth_handlers::login));

    // Protected auth routes (need auth)
    let protected_auth_routes = Router::new()
        .route("/me", get(auth_handlers::me))
        .route("/change-password", post(auth_handlers::change_password))
        .route("/update-profile", post(auth_handlers::update_profile_image))
        .route("/account", delete(auth_handlers::delete_account))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine auth routes - public first, then protected
    let auth_routes = Router::new()
        .merge(public_auth_routes)
        .merge(protected_auth_routes);

    let profile_routes = Router::new()
        .route(
            "/profile",
            get(profile_handlers::get_profile)
                .post(profile_handlers::create_profile)
                .put(profile_handlers::update_profile),
        )
        .route("/profiles", get(profile_handlers::list_profiles));

    let post_routes = Router::new()
        .route(
            "/",
            get(post_handlers::list_my_posts).post(post_handlers::create_post),
        )
        .route("/all", get(post_handlers::list_all_posts))
        .route(
            "/:id",
            get(post_handlers::get_post)
                .put(post_handlers::update_post)
                .delete(post_handlers::delete_post),
        );

    let ringtone_routes = Router::new()
        .route("/", get(ringtone_handlers::list_ringtones))
        .route("/upload", post(ringtone_handlers::upload_ringtone))
        .route("/active", get(ringtone_handlers::active_ringtone))
        .route("/:id", delete(ringtone_handlers::delete_ringtone))
        .route("/:id/activate", post(ringtone_handlers::activate_ringtone));

    let message_routes = Router::new()
        .route("/conversations", get(message_handlers::list_conversations))
        .route("/conversation/:user_id", get(message_handlers::get_messages))
        .route("/send", post(message_handlers::send_message));

    let connection_routes = Router::new()
        .route("/send", post(connection_handlers::send_request))
        .route("/:id/respond", post(connection_handlers::respond))
        .route("/status/:user_id", get(connection_handlers::get_status))
        .route("/pending", get(connection_handlers::list_pending))
        .route("/connected", get(connection_handlers::list_connected))
        .route(
            "/disconnect/:user_id",
            delete(connection_handlers::disconnect),
        );

    // Protected routes with auth middleware
    let protected_routes = Router::new()
        .merge(profile_routes)
        .merge(message_routes)
        .nest("/posts", post_routes)
        .nest("/ringtones", ringtone_routes)
        .nest("/connections", connection_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/call/:user_id", get(call_handlers::call_socket))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", protected_routes)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
