use async_trait::async_trait;

use crate::error::FeedError;
use crate::model::{EntryKey, FeedEntry, LikeState, SaveState};

pub mod mock;
pub mod rpc;
pub mod timeout;

pub use mock::{Gate, GatewayCall, MockGateway};
pub use rpc::{RpcGateway, RpcGatewayConfig};
pub use timeout::TimeoutGateway;

/// Backend boundary consumed by the engine. Every method is a suspension
/// point; nothing else in the engine awaits.
#[async_trait]
pub trait FeedGateway: Send + Sync {
    async fn fetch_page(
        &self,
        profile_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FeedEntry>, FeedError>;

    async fn toggle_like(&self, entry: EntryKey, profile_id: i64) -> Result<LikeState, FeedError>;

    async fn toggle_favorite(
        &self,
        entry: EntryKey,
        profile_id: i64,
    ) -> Result<SaveState, FeedError>;

    /// Fire-and-forget; the engine swallows failures.
    async fn record_announcement_view(&self, entry_id: i64) -> Result<(), FeedError>;
}
