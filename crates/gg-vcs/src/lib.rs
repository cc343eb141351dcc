pub mod backend;
pub mod detection;
pub mod git;
pub mod trailer;

#[cfg(test)]
mod testutil;

pub use crate::backend::{ConfigSource, LocalRepository, VcsError};
pub use crate::git::GitRepository;
pub use crate::trailer::extract_change_id;
