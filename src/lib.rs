//! Linkwatch - Connection Quality Monitor
//!
//! Samples network reachability to a fixed target at a steady cadence,
//! rolls the results into immutable timestamped JSON documents, and
//! serves those documents over a small read-only HTTP API.
//!
//! # Architecture
//!
//! - **Sampler**: fixed-size sampling sessions, one probe per cadence
//!   interval, published atomically as one document per session
//! - **Store**: an append-only directory of session documents, never
//!   edited after publish
//! - **Server**: stateless viewer over the store, plus a live-status
//!   passthrough to the dish's device API
//!
//! The sampler and the server are independent processes that share
//! nothing but the data directory.

pub mod config;
pub mod sampler;
pub mod server;
pub mod store;

pub use config::{ConfigError, SamplerConfig, ServerConfig};
pub use sampler::{Cadence, PingProber, Prober, Sampler};
pub use store::{SessionDocument, SessionStore, SourceMap, StoreError};
