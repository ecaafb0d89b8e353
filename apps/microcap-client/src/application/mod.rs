//! Application Layer
//!
//! Session ownership, login flows and the watchlist store. Depends on the
//! domain layer and on the port traits only.

pub mod ports;
pub mod services;
