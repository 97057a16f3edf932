//! Imperative shell of the plantops data layer.
//!
//! Wires the pure pieces of `plantops_core` to concrete state: the memory
//! cache, the coalescing read-through fetcher, the mutation gateway, the
//! activity logger and the error-report channel, composed by [`DataLayer`].

pub mod activity;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod reports;
pub mod state;
pub mod storage;

pub use activity::ActivityLogger;
pub use cache::MemoryCache;
pub use config::Config;
pub use error::{ConfigError, FetchError, GatewayError};
pub use fetch::ReadThroughFetcher;
pub use gateway::{Committed, MutationGateway, MutationOutcome};
pub use reports::{ErrorReport, ErrorReporter};
pub use state::DataLayer;
