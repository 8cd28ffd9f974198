//! Client-side feed session engine: paginated loading of a mixed
//! post/announcement feed over a backend RPC gateway, with optimistic
//! like/save toggles that reconcile against the server or roll back.

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::{FeedEngine, FeedSnapshot, FetchOutcome, ToggleOutcome};
pub use error::FeedError;
pub use gateway::{FeedGateway, RpcGateway, RpcGatewayConfig};
pub use model::{
    AnnouncementDetails, EntryDetails, EntryKey, EntryKind, FeedEntry, LikeState, SaveState,
};
