use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::{DynAuthService, JwtAuthService, TokenCodec, UserManager};
use crate::config::Config;
use crate::db::posts::PostStore;
use crate::db::users::UserStore;
use crate::media::{self, DynMediaHost};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: DynAuthService,
    pub users: UserManager,
    pub posts: PostStore,
    pub media: DynMediaHost,
}

impl AppState {
    /// Wire every service from one validated config.
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let media = media::from_config(&config)?;
        Ok(Self::with_media(db, config, media))
    }

    pub fn with_media(db: DbPool, config: Config, media: DynMediaHost) -> Self {
        let tokens = TokenCodec::new(config.secret());
        let user_store = UserStore::new(db.clone());

        let auth = Arc::new(JwtAuthService::new(
            user_store.clone(),
            tokens.clone(),
            config.auth.token_lifetime_secs,
        ));
        let users = UserManager::new(user_store, tokens, &config.auth);

        Self {
            posts: PostStore::new(db),
            config: Arc::new(config),
            auth,
            users,
            media,
        }
    }
}
