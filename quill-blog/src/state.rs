use std::sync::Arc;

use axum::extract::FromRef;
use quill_orm::Pool;
use quill_orm::integrations::axum::QuillState;

use crate::Db;
use crate::config::SessionConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: QuillState<Db>,
    pub session: Arc<SessionConfig>,
}

impl AppState {
    pub fn new(pool: Pool<Db>, session: SessionConfig) -> Self {
        Self {
            db: QuillState::new(pool),
            session: Arc::new(session),
        }
    }

    pub fn pool(&self) -> &Pool<Db> {
        &self.db.pool
    }
}

impl FromRef<AppState> for Pool<Db> {
    fn from_ref(state: &AppState) -> Self {
        Pool::from_ref(&state.db)
    }
}
