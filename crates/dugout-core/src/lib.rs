// Shared infrastructure: configuration, expiring caches and cancellation.

pub mod cache;
pub mod cancel;
pub mod config;

pub use cache::ExpiringCache;
pub use cancel::{cancel_pair, CancelHandle, CancelToken, LoadSlot, LoadTicket, Outcome};
pub use config::{load_config, Config, ConfigError};
