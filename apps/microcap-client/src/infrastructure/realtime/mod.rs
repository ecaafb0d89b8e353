//! Realtime Feed
//!
//! Streaming quote client: frame codec plus the connection-owning feed.

mod codec;
mod feed;

pub use codec::{FrameError, StreamMessage, decode_frame};
pub use feed::{FeedEvent, RealtimeError, RealtimeFeed};
