use crate::error::{GerritError, ResolutionError};
use crate::server::ReviewServer;
use crate::types::{ChangeChain, ChangeId};
use gg_vcs::{extract_change_id, LocalRepository, VcsError};
use tracing::debug;

/// Where the change to operate on comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSelector {
    Head,
    Commit(String),
    ChangeId(ChangeId),
}

/// The change the selector points at, before any chain expansion.
pub fn seed_change_id<R: LocalRepository + ?Sized>(
    repo: &R,
    selector: &ChangeSelector,
) -> Result<ChangeId, GerritError> {
    let (commit, message) = match selector {
        ChangeSelector::ChangeId(change) => return Ok(change.clone()),
        ChangeSelector::Commit(reference) => {
            let message = repo.commit_message(reference).map_err(|err| match err {
                VcsError::RefNotFound { .. } => GerritError::from(ResolutionError::InvalidCommit {
                    reference: reference.clone(),
                }),
                other => GerritError::from(other),
            })?;
            (reference.clone(), message)
        }
        ChangeSelector::Head => (repo.head_commit_ref()?, repo.current_commit_message()?),
    };
    let change = extract_change_id(&message)
        .ok_or_else(|| ResolutionError::MissingChangeId {
            commit: commit.clone(),
        })?;
    debug!(%commit, %change, "found Change-Id trailer");
    Ok(ChangeId::new(change)?)
}

/// Resolves the selector to the changes a command operates on. With `expand_chain`
/// the seed only locates the chain; the server's related list replaces it.
pub async fn resolve_chain<S, R>(
    server: &S,
    repo: &R,
    selector: &ChangeSelector,
    expand_chain: bool,
) -> Result<ChangeChain, GerritError>
where
    S: ReviewServer,
    R: LocalRepository + ?Sized,
{
    let seed = seed_change_id(repo, selector)?;
    if !expand_chain {
        return Ok(ChangeChain::single(seed));
    }
    let related = server
        .related_changes(&seed)
        .await
        .map_err(GerritError::remote(&seed))?;
    let chain = ChangeChain::from_ids(related).unwrap_or_else(|| ChangeChain::single(seed));
    debug!(changes = ?chain.ids(), "resolved change chain");
    Ok(chain)
}
