//! Application Services
//!
//! Stateful coordinators built on the ports. Each is constructed once by the
//! composition root and shared through `Arc`.

mod auth;
mod session;
mod watchlist;

pub use auth::{AuthService, EntitlementService};
pub use session::{DEFAULT_EVENT_CAPACITY, SessionManager};
pub use watchlist::WatchlistService;
