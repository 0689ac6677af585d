//! Terminal prompts.

use dialoguer::{Confirm, Input, Password};
use tracing::debug;

use crate::core::prompt::Prompter;
use crate::error::{Result, ValidationError};

/// Prompts on the attached terminal.
///
/// Without a terminal every question takes its default; `--yes` answers
/// every confirmation with yes.
#[derive(Debug, Clone)]
pub struct Terminal {
    assume_yes: bool,
    interactive: bool,
}

impl Terminal {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            interactive: console::user_attended_stderr(),
        }
    }
}

impl Prompter for Terminal {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            debug!(question, "assumed yes");
            return Ok(true);
        }
        if !self.interactive {
            debug!(question, default, "not a terminal, using default");
            return Ok(default);
        }
        Ok(Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()?)
    }

    fn secret(&self, question: &str) -> Result<String> {
        if !self.interactive {
            return Err(ValidationError::NonInteractive(question.to_string()).into());
        }
        Ok(Password::new().with_prompt(question).interact()?)
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        if !self.interactive {
            return match default {
                Some(d) => Ok(d.to_string()),
                None => Err(ValidationError::NonInteractive(question.to_string()).into()),
            };
        }
        let mut input = Input::<String>::new().with_prompt(question);
        if let Some(d) = default {
            input = input.default(d.to_string());
        }
        Ok(input.interact_text()?)
    }
}
