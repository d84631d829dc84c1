//! Interactive prompting
//!
//! Prompting is a capability passed into discovery rather than ambient
//! terminal access. When no terminal is attached every prompt is refused,
//! so unattended runs fail instead of guessing.

use std::collections::VecDeque;
use std::io::IsTerminal;

/// Prompt errors
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("no interactive session available")]
    NotInteractive,

    #[error("prompt failed: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    #[error("no scripted answer left for prompt '{0}'")]
    Exhausted(String),
}

/// Line-oriented prompting capability
pub trait Prompter {
    /// Whether a human can answer prompts
    fn is_interactive(&self) -> bool;

    /// Show `prompt` and read one line of input (may be empty)
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;
}

/// Prompts on the controlling terminal via dialoguer
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        if !self.is_interactive() {
            return Err(PromptError::NotInteractive);
        }
        let answer: String = dialoguer::Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

/// Refuses every prompt
#[derive(Debug, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn read_line(&mut self, _prompt: &str) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }
}

/// Answers prompts from a fixed list, recording what was asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts shown so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Exhausted(prompt.to_string()))
    }
}

/// Pick the terminal prompter when attended, otherwise refuse all prompts.
pub fn detect() -> Box<dyn Prompter> {
    let terminal = TerminalPrompter;
    if terminal.is_interactive() {
        Box::new(terminal)
    } else {
        Box::new(NonInteractive)
    }
}

/// Ask a yes/no question; anything but `y`/`yes` declines.
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> bool {
    if !prompter.is_interactive() {
        return false;
    }
    match prompter.read_line(&format!("{} [y/N]", question)) {
        Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            tracing::warn!(error = %e, "prompt failed; treating as no");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_refuses() {
        let mut prompter = NonInteractive;
        assert!(!prompter.is_interactive());
        assert!(matches!(prompter.read_line("?"), Err(PromptError::NotInteractive)));
        assert!(!confirm(&mut prompter, "Generate?"));
    }

    #[test]
    fn test_scripted_answers_in_order() {
        let mut prompter = ScriptedPrompter::new(["2", ""]);
        assert_eq!(prompter.read_line("first").unwrap(), "2");
        assert_eq!(prompter.read_line("second").unwrap(), "");
        assert!(matches!(prompter.read_line("third"), Err(PromptError::Exhausted(_))));
        assert_eq!(prompter.asked(), ["first", "second", "third"]);
    }

    #[test]
    fn test_confirm() {
        let mut prompter = ScriptedPrompter::new(["y", "YES", "", "nope"]);
        assert!(confirm(&mut prompter, "a"));
        assert!(confirm(&mut prompter, "b"));
        assert!(!confirm(&mut prompter, "c"));
        assert!(!confirm(&mut prompter, "d"));
        // Exhausted script declines
        assert!(!confirm(&mut prompter, "e"));
        assert_eq!(prompter.asked()[0], "a [y/N]");
    }
}
