use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FeedError;
use crate::model::{EntryKey, FeedEntry, LikeState, SaveState};

use super::FeedGateway;

/// Bounds every call of the wrapped gateway. An expired call resolves to
/// `FeedError::Timeout`, which the engine handles like any transport error.
pub struct TimeoutGateway {
    inner: Arc<dyn FeedGateway>,
    limit: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: Arc<dyn FeedGateway>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, FeedError>>,
    ) -> Result<T, FeedError> {
        tokio::time::timeout(self.limit, fut)
            .await
            .unwrap_or(Err(FeedError::Timeout(self.limit)))
    }
}

#[async_trait]
impl FeedGateway for TimeoutGateway {
    async fn fetch_page(
        &self,
        profile_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FeedEntry>, FeedError> {
        self.bounded(self.inner.fetch_page(profile_id, limit, offset)).await
    }

    async fn toggle_like(&self, entry: EntryKey, profile_id: i64) -> Result<LikeState, FeedError> {
        self.bounded(self.inner.toggle_like(entry, profile_id)).await
    }

    async fn toggle_favorite(
        &self,
        entry: EntryKey,
        profile_id: i64,
    ) -> Result<SaveState, FeedError> {
        self.bounded(self.inner.toggle_favorite(entry, profile_id)).await
    }

    async fn record_announcement_view(&self, entry_id: i64) -> Result<(), FeedError> {
        self.bounded(self.inner.record_announcement_view(entry_id)).await
    }
}
