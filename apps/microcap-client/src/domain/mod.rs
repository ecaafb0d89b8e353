//! Domain Layer - Session, content and realtime state.
//!
//! Pure types with no I/O. Everything here is serializable or a plain state
//! machine that the application and infrastructure layers drive.

/// Content records served by the backend (ideas, analysis, track record).
pub mod content;

/// Realtime quote stream state machine and control frames.
pub mod realtime;

/// Session and entitlement snapshot.
pub mod session;
