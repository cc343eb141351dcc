pub mod commands;
pub mod config;
pub mod error;
pub mod resolver;
pub mod review_payload;
pub mod server;

pub mod types;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use crate::commands::{Dispatcher, Report};
pub use crate::config::GerritConfig;
pub use crate::error::GerritError;
pub use crate::resolver::{resolve_chain, ChangeSelector};
pub use crate::server::ReviewServer;
