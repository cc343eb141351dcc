use crate::cli::{Command, HashtagArgs, ReviewArgs, TopicArgs, TransitionArgs};
use gg_core::review_payload::{self, TransformOptions};
use gg_core::types::{ChangeChain, HashtagEdit, StateTransition};
use gg_core::{
    resolve_chain, ChangeSelector, Dispatcher, GerritConfig, GerritError, Report, ReviewServer,
};
use gg_vcs::LocalRepository;
use tracing::debug;

pub struct Context<'a, S: ReviewServer, R: LocalRepository> {
    pub server: &'a S,
    pub repo: &'a R,
    pub config: &'a GerritConfig,
    pub selector: ChangeSelector,
    pub support_chain: bool,
}

/// Everything that can fail locally (payload, branch name) is settled before the first
/// request goes out.
pub async fn handle<S: ReviewServer, R: LocalRepository>(
    command: Command,
    ctx: &Context<'_, S, R>,
) -> Result<Report, GerritError> {
    let dispatcher = Dispatcher::new(ctx.server, ctx.config);
    match command {
        Command::Runverify(args) => {
            let chain = resolve(ctx).await?;
            if args.check {
                dispatcher.runverify_status(&chain).await
            } else {
                dispatcher.runverify(&chain).await
            }
        }
        Command::Topic(TopicArgs { set, .. }) => {
            let chain = resolve(ctx).await?;
            match set {
                Some(topic) => {
                    dispatcher
                        .set_topic(&chain, &topic, ctx.support_chain)
                        .await
                }
                None => dispatcher.topics(&chain).await,
            }
        }
        Command::Hashtag(HashtagArgs { check: true, .. }) => {
            let chain = resolve(ctx).await?;
            dispatcher.hashtags(&chain).await
        }
        Command::Hashtag(HashtagArgs { add, del, .. }) => {
            let edit = HashtagEdit { add, remove: del }.or_branch_name(ctx.repo)?;
            let chain = resolve(ctx).await?;
            dispatcher.edit_hashtags(&chain, &edit).await
        }
        Command::Wip(args) => {
            transition(ctx, &dispatcher, StateTransition::WorkInProgress, args).await
        }
        Command::Ready(args) => {
            transition(ctx, &dispatcher, StateTransition::Ready, args).await
        }
        Command::Private(args) => {
            transition(ctx, &dispatcher, StateTransition::Private, args).await
        }
        Command::Public(args) => {
            transition(ctx, &dispatcher, StateTransition::Public, args).await
        }
        Command::Abandon(args) => {
            transition(ctx, &dispatcher, StateTransition::Abandon, args).await
        }
        Command::Prepare => {
            let chain = resolve(ctx).await?;
            dispatcher.prepare(&chain).await
        }
        Command::Review(args) => review(ctx, &dispatcher, args).await,
    }
}

async fn resolve<S: ReviewServer, R: LocalRepository>(
    ctx: &Context<'_, S, R>,
) -> Result<ChangeChain, GerritError> {
    let chain = resolve_chain(ctx.server, ctx.repo, &ctx.selector, ctx.support_chain).await?;
    debug!(len = chain.ids().len(), "operating on chain");
    Ok(chain)
}

async fn transition<S: ReviewServer, R: LocalRepository>(
    ctx: &Context<'_, S, R>,
    dispatcher: &Dispatcher<'_, S>,
    transition: StateTransition,
    args: TransitionArgs,
) -> Result<Report, GerritError> {
    let chain = resolve(ctx).await?;
    dispatcher
        .transition(&chain, transition, args.message.as_deref())
        .await
}

async fn review<S: ReviewServer, R: LocalRepository>(
    ctx: &Context<'_, S, R>,
    dispatcher: &Dispatcher<'_, S>,
    args: ReviewArgs,
) -> Result<Report, GerritError> {
    let payload = match args.payload {
        Some(path) => {
            let options = TransformOptions {
                keep_labels: args.keep_labels,
                path_prefixes: args.trim_path_prefix,
                robot_id: args.robot_id,
                notify: args.notify.into(),
            };
            Some(review_payload::load_and_transform(&path, &options)?)
        }
        None => None,
    };
    let chain = resolve(ctx).await?;
    match payload {
        Some(payload) => dispatcher.review(&chain, &payload).await,
        None => dispatcher.robot_comments(&chain).await,
    }
}
