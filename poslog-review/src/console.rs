//! Terminal view: parses operator commands into intents and renders views
//!
//! Pure text in, text out; the binary owns stdin and stdout.

use crate::error::{ReviewError, ReviewResult};
use crate::models::{TokenStatus, NO_TAG};
use crate::session::{EndDecision, Intent, NavigationMode, Outcome, ViewState};
use poslog_common::events::Direction;
use std::fmt::Write;

pub const HELP: &str = "\
Commands:
  n / p          next / previous item
  > / <          next / previous unsolved item (also nu / pu)
  g INDEX        go to item
  t TOKEN TAG    set the manual tag of a token (TAG `-----` clears it)
  c TOKEN        clear the manual tag of a token
  a              apply the majority to every token
  m              show the tag menu
  s              save
  y / r          at the end of the review: save and exit / restart
  v              show the current item
  q              quit (q! discards unsaved changes)
  h              this help";

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Show,
    Menu,
    Help,
    Quit { force: bool },
}

fn navigate(direction: Direction, mode: NavigationMode) -> Command {
    Command::Intent(Intent::Navigate { direction, mode })
}

fn parse_index(arg: Option<&str>, what: &str) -> ReviewResult<usize> {
    let arg = arg.ok_or_else(|| ReviewError::Input(format!("missing {}", what)))?;
    arg.parse()
        .map_err(|_| ReviewError::Input(format!("{} must be a number, got '{}'", what, arg)))
}

/// Parse one input line
pub fn parse_command(line: &str) -> ReviewResult<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Show);
    };

    let command = match verb {
        "n" => navigate(Direction::Forward, NavigationMode::Sequential),
        "p" => navigate(Direction::Backward, NavigationMode::Sequential),
        ">" | "nu" => navigate(Direction::Forward, NavigationMode::Unsolved),
        "<" | "pu" => navigate(Direction::Backward, NavigationMode::Unsolved),
        "g" => Command::Intent(Intent::SelectIndex {
            index: parse_index(words.next(), "item index")?,
        }),
        "t" => {
            let token = parse_index(words.next(), "token index")?;
            // Tags may contain spaces (`UNK-- XYZ`)
            let value = words.by_ref().collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                return Err(ReviewError::Input(format!(
                    "missing tag (use `c {}` to clear)",
                    token
                )));
            }
            Command::Intent(Intent::SetTag {
                token,
                value: Some(value),
            })
        }
        "c" => Command::Intent(Intent::SetTag {
            token: parse_index(words.next(), "token index")?,
            value: None,
        }),
        "a" => Command::Intent(Intent::ApplyMajorityToAll),
        "s" => Command::Intent(Intent::Save),
        "y" => Command::Intent(Intent::ConfirmEnd {
            decision: EndDecision::SaveAndExit,
        }),
        "r" => Command::Intent(Intent::ConfirmEnd {
            decision: EndDecision::Restart,
        }),
        "v" => Command::Show,
        "m" => Command::Menu,
        "h" | "?" => Command::Help,
        "q" => Command::Quit { force: false },
        "q!" => Command::Quit { force: true },
        other => return Err(ReviewError::Input(format!("unknown command '{}'", other))),
    };

    if words.next().is_some() {
        return Err(ReviewError::Input(format!("too many arguments for '{}'", verb)));
    }
    Ok(command)
}

fn tag_or_marker(tag: &Option<String>) -> &str {
    tag.as_deref().unwrap_or(NO_TAG)
}

fn status_marker(status: TokenStatus) -> char {
    match status {
        TokenStatus::Unset => '?',
        TokenStatus::DivergesFromMajority => '*',
        TokenStatus::MatchesMajority => ' ',
    }
}

/// Render the full view
pub fn render_view(view: &ViewState) -> String {
    let mut out = String::new();
    let progress = &view.progress;

    let position = progress
        .position
        .map(|p| format!("{}/{}", p + 1, progress.total))
        .unwrap_or_else(|| format!("-/{}", progress.total));
    let _ = write!(out, "[{}] solved {}/{}", position, progress.solved, progress.total);
    if view.unsaved_changes {
        out.push_str(" | unsaved changes");
    }
    out.push('\n');

    if view.finished {
        out.push_str("Session finished.\n");
        return out;
    }

    match &view.current {
        Some(item) => {
            let _ = writeln!(
                out,
                "#{} {}{}",
                item.index,
                item.log_line,
                if item.solved { "" } else { "  (unsolved)" }
            );
            let _ = writeln!(
                out,
                "   {:>3}  {:<20} {:<8} {:<8} {:>5}  {:<8} choices",
                "tok", "token", "manual", "majority", "conf", "seed"
            );
            for (i, token) in item.tokens.iter().enumerate() {
                let _ = writeln!(
                    out,
                    " {} {:>3}  {:<20} {:<8} {:<8} {:>5.2}  {:<8} {}",
                    status_marker(token.status),
                    i,
                    token.token,
                    tag_or_marker(&token.manual),
                    tag_or_marker(&token.majority),
                    token.confidence,
                    tag_or_marker(&token.seed_majority),
                    token.choices.join(" ")
                );
            }
        }
        None => out.push_str("No item selected.\n"),
    }

    let nav = &view.navigation;
    let controls: Vec<&str> = [
        (nav.next, "n"),
        (nav.previous, "p"),
        (nav.next_unsolved, ">"),
        (nav.previous_unsolved, "<"),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, key)| key)
    .collect();
    let _ = writeln!(
        out,
        "navigation: {}",
        if controls.is_empty() {
            "none".to_string()
        } else {
            controls.join(" ")
        }
    );

    if let Some(direction) = view.pending_end {
        out.push_str(&end_prompt(direction));
        out.push('\n');
    }
    out
}

/// Prompt shown when navigation ran out of items
pub fn end_prompt(direction: Direction) -> String {
    let side = match direction {
        Direction::Forward => "end",
        Direction::Backward => "beginning",
    };
    format!(
        "Reached the {} of the review. Save and exit [y] or restart at the first item [r]?",
        side
    )
}

/// One-line summary of an outcome
pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Selected { index } => format!("Selected item {}", index),
        Outcome::TagSet { solved: true } => "Item solved".to_string(),
        Outcome::TagSet { solved: false } => "Item still unsolved".to_string(),
        Outcome::EndOfReview { direction } => end_prompt(*direction),
        Outcome::Saved { report } if report.unsolved.is_empty() => {
            format!("Saved to {}", report.output.display())
        }
        Outcome::Saved { report } => format!(
            "Saved to {} ({} unsolved items: {:?})",
            report.output.display(),
            report.unsolved.len(),
            report.unsolved
        ),
        Outcome::Restarted => "Restarted at the first item".to_string(),
        Outcome::Ended => "Session ended".to_string(),
    }
}

/// Tag menu, "no tag" marker first
pub fn render_menu(menu: &[&str]) -> String {
    menu.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ItemView, NavAvailability, Progress, TokenView};
    use uuid::Uuid;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(
            parse_command(">").unwrap(),
            navigate(Direction::Forward, NavigationMode::Unsolved)
        );
        assert_eq!(
            parse_command("pu").unwrap(),
            navigate(Direction::Backward, NavigationMode::Unsolved)
        );
        assert_eq!(
            parse_command("  p ").unwrap(),
            navigate(Direction::Backward, NavigationMode::Sequential)
        );
    }

    #[test]
    fn test_parse_set_and_clear() {
        assert_eq!(
            parse_command("t 2 VERB").unwrap(),
            Command::Intent(Intent::SetTag {
                token: 2,
                value: Some("VERB".to_string())
            })
        );
        assert_eq!(
            parse_command("c 2").unwrap(),
            Command::Intent(Intent::SetTag {
                token: 2,
                value: None
            })
        );
        assert_eq!(
            parse_command("t 0 UNK-- XYZ").unwrap(),
            Command::Intent(Intent::SetTag {
                token: 0,
                value: Some("UNK-- XYZ".to_string())
            })
        );
        assert!(parse_command("t 2").is_err());
        assert!(parse_command("t x VERB").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_and_extra_args() {
        assert!(parse_command("jump").is_err());
        assert!(parse_command("s now").is_err());
        assert_eq!(parse_command("").unwrap(), Command::Show);
        assert_eq!(parse_command("q!").unwrap(), Command::Quit { force: true });
    }

    #[test]
    fn test_render_view_marks_tokens() {
        let view = ViewState {
            session_id: Uuid::nil(),
            current: Some(ItemView {
                index: 0,
                log_line: "Connection refused".to_string(),
                solved: false,
                diverges_from_majority: true,
                tokens: vec![
                    TokenView {
                        token: "Connection".to_string(),
                        seed_majority: Some("NOUN".to_string()),
                        majority: Some("NOUN".to_string()),
                        confidence: 1.0,
                        manual: Some("NOUN".to_string()),
                        status: TokenStatus::MatchesMajority,
                        choices: vec!["NOUN".to_string()],
                    },
                    TokenView {
                        token: "refused".to_string(),
                        seed_majority: None,
                        majority: None,
                        confidence: 0.0,
                        manual: None,
                        status: TokenStatus::Unset,
                        choices: vec!["ADJ".to_string(), "VERB".to_string()],
                    },
                ],
            }),
            finished: false,
            navigation: NavAvailability {
                next: true,
                ..Default::default()
            },
            pending_end: Some(Direction::Forward),
            last_save: None,
            progress: Progress {
                position: Some(0),
                total: 2,
                solved: 0,
            },
            unsaved_changes: true,
        };

        let text = render_view(&view);

        assert!(text.starts_with("[1/2] solved 0/2 | unsaved changes"));
        assert!(text.contains("#0 Connection refused  (unsolved)"));
        assert!(text.contains(" ?   1  refused"));
        assert!(text.contains("ADJ VERB"));
        assert!(text.contains("navigation: n\n"));
        assert!(text.contains("Save and exit [y]"));
    }
}
