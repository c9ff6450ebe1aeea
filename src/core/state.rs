use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::analyzer::AnalyzerApi;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    analyzer: Arc<dyn AnalyzerApi>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        analyzer: Arc<dyn AnalyzerApi>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, analyzer }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn analyzer(&self) -> &dyn AnalyzerApi {
        self.inner.analyzer.as_ref()
    }
}
