//! Viewport broadcast hub and streaming server for Lifestream.
//!
//! This crate fans the evolving board out to many viewers, each watching
//! its own rectangle of the torus:
//!
//! - [`hub`] -- [`SubscriptionHub`], the subscriber registry and its
//!   per-generation broadcast pass
//! - [`broadcast`] -- [`BroadcastDriver`], the periodic task that runs
//!   passes over the latest published generation
//! - [`subscription`] -- [`run_subscription`], the per-connection
//!   lifecycle with guaranteed removal
//! - **`WebSocket` endpoint** (`/ws/board`) streaming JSON
//!   [`BoardUpdate`](lifestream_types::BoardUpdate) frames
//! - **REST endpoints** for status and the pattern catalog
//!
//! # Architecture
//!
//! The board and the registry are guarded independently. The evolution
//! driver writes the board; the broadcast driver reads it and walks a
//! snapshot of the registry, so connection churn never blocks evolution
//! and subscriber I/O never holds either lock.

pub mod broadcast;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod state;
pub mod subscription;
pub mod ws;

// Re-export primary types for convenience.
pub use broadcast::BroadcastDriver;
pub use error::ApiError;
pub use hub::{BroadcastReport, HubError, Subscription, SubscriptionHub};
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
pub use subscription::{SubscriptionGuard, run_subscription};
