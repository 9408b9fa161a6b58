//! Terminal prompts for bucket selection

use dialoguer::{Confirm, Input};

use funpack_engine::{PackageError, Prompter};

/// Asks on the controlling terminal
pub struct TerminalPrompter;

fn prompt_error(err: dialoguer::Error) -> PackageError {
    PackageError::Prompt {
        message: err.to_string(),
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> funpack_engine::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, prompt: &str) -> funpack_engine::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }
}
