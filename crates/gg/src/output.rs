use gg_core::commands::{AppliedChange, Outcome, VerifyStatus};
use gg_core::types::{ChangeId, RobotCommentInfo};
use gg_core::{GerritError, Report};
use owo_colors::{OwoColorize, Stream};
use std::io::{self, Write};

pub fn render(report: &Report, out: &mut impl Write) -> io::Result<()> {
    match report {
        Report::Verify(statuses) => statuses.iter().try_for_each(|s| verify(s, out)),
        Report::Topics(topics) => topics.iter().try_for_each(|(change, topic)| {
            let topic = topic.as_deref().unwrap_or("(no topic)");
            writeln!(out, "{}: {topic}", label(change))
        }),
        Report::Hashtags(hashtags) => hashtags.iter().try_for_each(|(change, tags)| {
            let tags = if tags.is_empty() {
                "(no hashtags)".to_string()
            } else {
                tags.join(", ")
            };
            writeln!(out, "{}: {tags}", label(change))
        }),
        Report::Applied(applied) => applied.iter().try_for_each(|a| applied_change(a, out)),
        Report::RobotComments { change, comments } => robot_comments(change, comments, out),
    }
}

/// The one line a fatal error leaves on stderr, whatever the log filter says.
pub fn render_error(err: &GerritError, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "error: {err}")
}

fn label(change: &ChangeId) -> String {
    change
        .as_str()
        .if_supports_color(Stream::Stdout, |text| text.bold())
        .to_string()
}

fn verify(status: &VerifyStatus, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{} {}", label(&status.change), status.subject)?;
    writeln!(
        out,
        "  {}",
        status
            .link
            .if_supports_color(Stream::Stdout, |text| text.underline())
    )?;
    if status.votes.is_empty() {
        return writeln!(out, "  no votes");
    }
    for (name, vote) in &status.votes {
        let value = format!("{:+}", vote.value);
        let value = if vote.value > 0 {
            value
                .if_supports_color(Stream::Stdout, |text| text.green())
                .to_string()
        } else {
            value
                .if_supports_color(Stream::Stdout, |text| text.red())
                .to_string()
        };
        writeln!(out, "  {name} {value} {}", vote.account)?;
    }
    Ok(())
}

fn applied_change(applied: &AppliedChange, out: &mut impl Write) -> io::Result<()> {
    match &applied.outcome {
        Outcome::Applied => writeln!(
            out,
            "{}: {}",
            label(&applied.change),
            applied
                .action
                .if_supports_color(Stream::Stdout, |text| text.green())
        ),
        Outcome::Unchanged { reason } => writeln!(
            out,
            "{}: {} unchanged ({reason})",
            label(&applied.change),
            applied
                .action
                .if_supports_color(Stream::Stdout, |text| text.yellow())
        ),
    }
}

fn robot_comments(
    change: &ChangeId,
    comments: &[RobotCommentInfo],
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{}: {} robot comments", label(change), comments.len())?;
    for comment in comments {
        let location = match comment.line {
            Some(line) => format!("{}:{line}", comment.path),
            None => comment.path.clone(),
        };
        writeln!(out, "  {location} [{}] {}", comment.robot_id, comment.message)?;
    }
    Ok(())
}
