// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bang commands. Only all-caps command names are recognized.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Commands the bot answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CommandName {
    Upvote,
    Downvote,
    Score,
    Help,
}

impl CommandName {
    /// One-line description for `!HELP <COMMAND>`.
    pub fn description(self) -> &'static str {
        match self {
            Self::Upvote => "!UPVOTE: MAKES THE LAST THING I SAID MORE LIKELY TO COME BACK",
            Self::Downvote => "!DOWNVOTE: MAKES THE LAST THING I SAID GO AWAY, MAYBE FOREVER",
            Self::Score => "!SCORE: TELLS YOU WHAT EVERYBODY THINKS OF THE LAST THING I SAID",
            Self::Help => "OH WOW YOU ARE SO META I AM SO IMPRESSED",
        }
    }
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Known {
        name: CommandName,
        args: Vec<String>,
    },
    /// All caps but not one of ours. Swallowed without a reply.
    Unknown(String),
}

impl Command {
    /// Parses `text` as a command.
    ///
    /// Returns `None` when the first word does not start with `prefix` or
    /// the command name is not entirely `A-Z`, so the line is handled as
    /// ordinary chat.
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let name = words.next()?.strip_prefix(prefix)?;
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let args = words.map(str::to_string).collect();

        Some(match name.parse::<CommandName>() {
            Ok(name) => Self::Known { name, args },
            Err(_) => Self::Unknown(name.to_string()),
        })
    }
}

/// Reply to `!HELP` with the given arguments.
pub fn help_text(prefix: &str, args: &[String]) -> String {
    match args {
        [] => {
            let names: Vec<String> = CommandName::iter().map(|c| format!("{prefix}{c}")).collect();
            format!("I HAVE COMMANDS AND THEY ARE: {}", names.join(" "))
        }
        [topic] => {
            let bare = topic.strip_prefix(prefix).unwrap_or(topic);
            match bare.to_ascii_uppercase().parse::<CommandName>() {
                Ok(name) => name.description().to_string(),
                Err(_) => format!("{prefix}{topic} IS NOT A COMMAND YOU TWIT"),
            }
        }
        _ => "WTF ARE YOU DUMB?  I OFFER HELP FOR ONE COMMAND AT A TIME JERKFACE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_with_args() {
        assert_eq!(
            Command::parse("!HELP SCORE", "!"),
            Some(Command::Known {
                name: CommandName::Help,
                args: vec!["SCORE".to_string()],
            })
        );
        assert_eq!(
            Command::parse("  !UPVOTE  ", "!"),
            Some(Command::Known {
                name: CommandName::Upvote,
                args: vec![],
            })
        );
    }

    #[test]
    fn lowercase_commands_are_not_commands() {
        assert_eq!(Command::parse("!upvote", "!"), None);
        assert_eq!(Command::parse("!Upvote", "!"), None);
    }

    #[test]
    fn unknown_caps_commands_are_swallowed() {
        assert_eq!(
            Command::parse("!DONGME", "!"),
            Some(Command::Unknown("DONGME".to_string()))
        );
    }

    #[test]
    fn other_prefixes_and_plain_text_are_ignored() {
        assert_eq!(Command::parse("UPVOTE", "!"), None);
        assert_eq!(Command::parse("!", "!"), None);
        assert_eq!(Command::parse("", "!"), None);
        assert_eq!(
            Command::parse(".SCORE", "."),
            Some(Command::Known {
                name: CommandName::Score,
                args: vec![],
            })
        );
    }

    #[test]
    fn numbers_in_names_are_rejected() {
        assert_eq!(Command::parse("!UPVOTE2", "!"), None);
    }

    #[test]
    fn help_lists_every_command() {
        assert_eq!(
            help_text("!", &[]),
            "I HAVE COMMANDS AND THEY ARE: !UPVOTE !DOWNVOTE !SCORE !HELP"
        );
    }

    #[test]
    fn help_for_one_command() {
        let text = help_text("!", &["SCORE".to_string()]);
        assert!(text.starts_with("!SCORE:"), "{text}");
        let text = help_text("!", &["!downvote".to_string()]);
        assert!(text.starts_with("!DOWNVOTE:"), "{text}");
    }

    #[test]
    fn help_scolds_bad_requests() {
        assert_eq!(
            help_text("!", &["RPS".to_string()]),
            "!RPS IS NOT A COMMAND YOU TWIT"
        );
        assert!(help_text("!", &["A".to_string(), "B".to_string()]).starts_with("WTF"));
    }
}
