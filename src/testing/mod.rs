//! Helpers shared by unit tests: in-memory stores, per-user handles and a
//! router wired to them.

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use crate::app::{app, AppState};
use crate::auth::{AuthUser, JwtIdentity};
use crate::database::{Db, MemoryStore, Store};

pub const TEST_JWT_SECRET: &str = "notebook-test-secret";

pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

pub fn db_for(store: &Arc<dyn Store>, user_id: Uuid) -> Db {
    Db::new(store.clone(), AuthUser::new(user_id))
}

/// Router backed by `store`, accepting tokens signed with [`TEST_JWT_SECRET`]
pub fn test_app(store: Arc<dyn Store>) -> Router {
    app(AppState::new(store, Arc::new(JwtIdentity::new(TEST_JWT_SECRET))))
}

/// Bearer token for `user_id`
pub fn token_for(user_id: Uuid) -> String {
    JwtIdentity::new(TEST_JWT_SECRET)
        .issue(user_id, None)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_differ_per_user() {
        assert_ne!(token_for(Uuid::new_v4()), token_for(Uuid::new_v4()));
    }
}
