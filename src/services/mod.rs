// src/services/mod.rs
//
// Services Module - the artwork delivery pipeline

pub mod feed_service;
pub mod history;
pub mod pool_service;
pub mod sampler;


pub use feed_service::{FeedConfig, FeedService};
pub use history::{HistoryState, HISTORY_CAP};
pub use pool_service::{IdentifierPool, PoolConfig, PoolService};
pub use sampler::{SamplerConfig, SamplerService, SamplerState};
