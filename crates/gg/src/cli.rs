use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use gg_core::types::{ChangeId, NotifyLevel};
use gg_core::ChangeSelector;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "git-gerrit",
    version,
    about = "Command line tool to interact with gerrit change requests",
    disable_version_flag = true
)]
pub struct Cli {
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    #[arg(short = 'l', long = "loglevel", global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Operate on this change instead of the one named by HEAD's Change-Id trailer
    #[arg(long = "changeid", global = true, value_name = "ID", conflicts_with = "commit")]
    pub change_id: Option<ChangeId>,

    /// Read the Change-Id trailer from this commit instead of HEAD
    #[arg(long, global = true, value_name = "REF")]
    pub commit: Option<String>,

    /// Operate on every change related to the selected one
    #[arg(long = "support-chain", global = true)]
    pub support_chain: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn selector(&self) -> ChangeSelector {
        match (&self.change_id, &self.commit) {
            (Some(change), _) => ChangeSelector::ChangeId(change.clone()),
            (None, Some(commit)) => ChangeSelector::Commit(commit.clone()),
            (None, None) => ChangeSelector::Head,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_tracing(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Trigger a verification run, or show verification status with --check
    Runverify(RunverifyArgs),
    /// Show or set the topic
    Topic(TopicArgs),
    /// Show, add or remove hashtags
    Hashtag(HashtagArgs),
    /// Mark as work in progress
    Wip(TransitionArgs),
    /// Mark as ready for review
    Ready(TransitionArgs),
    /// Mark as private
    Private(TransitionArgs),
    /// Remove the private flag
    Public(TransitionArgs),
    /// Abandon the change
    Abandon(TransitionArgs),
    /// Tag, publish and ready a chain, parking everything below the top on the no-build topic
    Prepare,
    /// Post review-tool findings as robot comments
    Review(ReviewArgs),
}

#[derive(Args)]
pub struct RunverifyArgs {
    /// Show link and votes instead of triggering
    #[arg(short, long)]
    pub check: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TopicArgs {
    #[arg(short, long)]
    pub check: bool,
    #[arg(short, long, value_name = "TOPIC")]
    pub set: Option<String>,
}

#[derive(Args)]
pub struct HashtagArgs {
    #[arg(short, long, conflicts_with_all = ["add", "del"])]
    pub check: bool,
    /// Hashtag to add; repeatable. Defaults to the active branch name
    #[arg(short, long = "add", value_name = "TAG")]
    pub add: Vec<String>,
    /// Hashtag to remove; repeatable
    #[arg(short, long = "del", value_name = "TAG")]
    pub del: Vec<String>,
}

#[derive(Args)]
pub struct TransitionArgs {
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct ReviewArgs {
    /// List robot comments already on the change
    #[arg(short, long, conflicts_with = "payload")]
    pub check: bool,
    /// Review-tool output in JSON
    #[arg(long, value_name = "FILE", required_unless_present = "check")]
    pub payload: Option<PathBuf>,
    /// Path prefix stripped from file names in the payload; repeatable
    #[arg(long = "trim-path-prefix", value_name = "PREFIX")]
    pub trim_path_prefix: Vec<String>,
    #[arg(long = "robot_id", value_name = "ID", default_value = "gitgerrit")]
    pub robot_id: String,
    #[arg(short, long, value_enum, default_value_t = NotifyArg::Owner)]
    pub notify: NotifyArg,
    /// Pass the payload's labels on to Gerrit
    #[arg(short, long)]
    pub keep_labels: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NotifyArg {
    #[value(name = "NONE")]
    None,
    #[value(name = "OWNER")]
    Owner,
    #[value(name = "OWNER_REVIEWERS")]
    OwnerReviewers,
    #[value(name = "ALL")]
    All,
}

impl From<NotifyArg> for NotifyLevel {
    fn from(value: NotifyArg) -> Self {
        match value {
            NotifyArg::None => Self::None,
            NotifyArg::Owner => Self::Owner,
            NotifyArg::OwnerReviewers => Self::OwnerReviewers,
            NotifyArg::All => Self::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("git-gerrit").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_selectors_after_subcommand() {
        let cli = parse(&["topic", "--check", "--changeid", "I1234", "--support-chain"]).unwrap();
        assert!(cli.support_chain);
        assert_eq!(
            cli.selector(),
            ChangeSelector::ChangeId(ChangeId::new("I1234").unwrap())
        );
    }

    #[test]
    fn test_changeid_and_commit_conflict() {
        assert!(parse(&["--changeid", "I1", "--commit", "HEAD~1", "wip"]).is_err());
    }

    #[test]
    fn test_topic_requires_exactly_one_mode() {
        assert!(parse(&["topic"]).is_err());
        assert!(parse(&["topic", "-c", "-s", "NOCI"]).is_err());
        let cli = parse(&["topic", "-s", "NOCI"]).unwrap();
        let Command::Topic(args) = cli.command else {
            panic!("expected topic");
        };
        assert_eq!(args.set.as_deref(), Some("NOCI"));
    }

    #[test]
    fn test_hashtag_check_conflicts_with_edits() {
        assert!(parse(&["hashtag", "-c", "-a", "x"]).is_err());
        let cli = parse(&["hashtag", "-a", "x", "-a", "y", "-d", "z"]).unwrap();
        let Command::Hashtag(args) = cli.command else {
            panic!("expected hashtag");
        };
        assert_eq!(args.add, vec!["x", "y"]);
        assert_eq!(args.del, vec!["z"]);
    }

    #[test]
    fn test_review_defaults() {
        let cli = parse(&["review", "--payload", "out.json", "--robot_id", "tidy"]).unwrap();
        let Command::Review(args) = cli.command else {
            panic!("expected review");
        };
        assert_eq!(args.robot_id, "tidy");
        assert_eq!(NotifyLevel::from(args.notify), NotifyLevel::Owner);
        assert!(!args.keep_labels);
        assert!(parse(&["review"]).is_err());
        assert!(parse(&["review", "--check"]).is_ok());
        assert!(parse(&["review", "--payload", "x", "-n", "OWNER_REVIEWERS"]).is_ok());
    }

    #[test]
    fn test_review_check_rejects_payload() {
        assert!(parse(&["review", "--check", "--payload", "out.json"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        let cli = parse(&["-l", "critical", "prepare"]).unwrap();
        assert_eq!(cli.log_level.as_tracing(), Level::ERROR);
        let cli = parse(&["prepare"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.selector(), ChangeSelector::Head);
    }
}
