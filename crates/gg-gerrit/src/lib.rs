mod client;
mod wire;

pub use crate::client::GerritClient;
