pub mod auth;
pub mod media;
pub mod posts;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::MediaProvider;
use crate::state::AppState;

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(posts::router());

    if state.config.media.provider == MediaProvider::Local {
        router = router.route("/media/{*path}", get(media::serve));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
