//! Forex Factory High Impact Notifier
//!
//! Fetches the weekly economic calendar, keeps upcoming high-impact events and
//! relays them to a Telegram chat.
//!
//! ## Architecture
//!
//! ```text
//! Feed (HTTP) → Filter → Dedup → Formatter → Notifier (Telegram)
//!                          ↑
//!     Drivers: web server (startup + /send), command bot, scheduled handler
//! ```

pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod filter;
pub mod formatter;
pub mod notify;
pub mod pipeline;
pub mod scheduled;
pub mod server;
pub mod telegram;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod config_tests;
