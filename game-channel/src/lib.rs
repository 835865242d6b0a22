//! Live game state feed that survives dropped connections.
//!
//! A channel owns one transport connection at a time. Every message is decoded
//! into a snapshot and handed to the consumer in wire order. Unexpected closures
//! are retried after a backoff delay until the retry budget runs out, at which
//! point a single fatal error is reported.
use cfg_if::cfg_if;

mod backoff;
mod channel;
mod error;
mod timer;
mod transport;

pub use backoff::{Backoff, BackoffConfig, ExponentialBackoff, InverseBudgetBackoff};
pub use channel::{
    ChannelBuilder, ChannelConfig, ChannelHandle, ChannelState, RetryAttempt, RetryBudget,
    StateChannel, DEFAULT_MAX_RETRIES,
};
pub use error::{ChannelError, TransportError};
pub use timer::Sleeper;
pub use transport::{Connector, TransportEvent};

cfg_if! { if #[cfg(target_arch = "wasm32")] {
    mod web;

    pub use timer::BrowserSleeper;
    pub use web::{WebSocketConnection, WebSocketConnector};
}}
