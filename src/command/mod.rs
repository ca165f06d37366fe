pub mod handler;
pub mod signature;

use crate::error::{AppError, Result};

/// An operator command recognised from chat text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `merge #<number>`
    Merge { number: u64 },
    /// `prepare next`
    PrepareNext,
}

impl Command {
    /// Parse chat text. Case and surrounding whitespace are ignored, as is a
    /// leading `@mention` of the bot.
    pub fn parse(text: &str) -> Result<Self> {
        let lowered = text.trim().to_lowercase();
        let mut words: Vec<&str> = lowered.split_whitespace().collect();
        if words.first().is_some_and(|w| w.starts_with('@')) {
            words.remove(0);
        }

        match words.as_slice() {
            ["prepare", "next"] => Ok(Command::PrepareNext),
            ["merge", reference] => reference
                .strip_prefix('#')
                .and_then(|n| n.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .map(|number| Command::Merge { number })
                .ok_or_else(|| AppError::InvalidCommand(text.trim().to_string())),
            _ => Err(AppError::InvalidCommand(text.trim().to_string())),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Merge { number } => write!(f, "merge #{number}"),
            Command::PrepareNext => write!(f, "prepare next"),
        }
    }
}
