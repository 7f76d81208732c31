//! URL input dialog

use std::io;

use dialoguer::{Input, theme::ColorfulTheme};
use thiserror::Error;

const TITLE: &str = "Enter Image URL";
const HINT: &str = "Image URL";
const CANCEL_COMMAND: &str = ":q";

/// Result of one dialog round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogChoice {
    /// Submit the entered text as-is; blank input is reported by the loader
    Load(String),
    Cancel,
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("url dialog failed: {0}")]
    Dialog(#[from] dialoguer::Error),
}

/// Map raw dialog text to a choice.
pub fn interpret(input: &str) -> DialogChoice {
    if input.trim() == CANCEL_COMMAND {
        DialogChoice::Cancel
    } else {
        DialogChoice::Load(input.to_string())
    }
}

/// Show the dialog and block until the user confirms or cancels.
///
/// End of input (Ctrl-D, closed stdin) counts as Cancel.
pub fn ask() -> Result<DialogChoice, PromptError> {
    let result = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{TITLE} ({HINT}, {CANCEL_COMMAND} to cancel)"))
        .allow_empty(true)
        .interact_text();

    match result {
        Ok(text) => Ok(interpret(&text)),
        Err(dialoguer::Error::IO(err))
            if matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(DialogChoice::Cancel)
        }
        Err(err) => Err(err.into()),
    }
}
