use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::storage::DocumentStorage;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Row-level persistence. Default: `PgStore` over the hosted database.
    pub store: Arc<dyn Store>,
    /// Hosted identity provider (sign-in, sessions, admin user listing).
    pub identity: Arc<dyn IdentityProvider>,
    /// Object storage for CVs and avatars.
    pub storage: Arc<dyn DocumentStorage>,
    pub config: Config,
}
