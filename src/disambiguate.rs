//! Choosing among several discovered candidates
//!
//! A choice is only ever made by a human. Without an interactive session the
//! chooser fails immediately; callers turn that into a fatal error naming the
//! explicit override.

use std::fmt;

use crate::prompt::{PromptError, Prompter};

/// Why no candidate was chosen
#[derive(Debug, thiserror::Error)]
pub enum DisambiguationError {
    #[error("no interactive session to choose from {count} candidates")]
    NotInteractive { count: usize },

    #[error("no candidates to choose from")]
    NoCandidates,

    #[error("invalid selection '{input}': expected a number from 1 to {count}")]
    InvalidSelection { input: String, count: usize },

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Interpret a selection line.
///
/// Empty input selects `default_index`. Indices are 1-based on input;
/// the result is 0-based.
pub fn parse_selection(input: &str, default_index: usize, count: usize) -> Option<usize> {
    let trimmed = input.trim();
    let selected = if trimmed.is_empty() {
        default_index
    } else {
        trimmed.parse::<usize>().ok()?
    };
    (1..=count).contains(&selected).then(|| selected - 1)
}

/// Ask the user to pick one of `candidates`.
///
/// Returns the 0-based index of the chosen candidate. `default_index` is
/// 1-based and is used when the user just presses enter.
pub fn choose<T: fmt::Display>(
    prompter: &mut dyn Prompter,
    prompt: &str,
    default_index: usize,
    candidates: &[T],
) -> Result<usize, DisambiguationError> {
    if candidates.is_empty() {
        return Err(DisambiguationError::NoCandidates);
    }
    if !prompter.is_interactive() {
        return Err(DisambiguationError::NotInteractive {
            count: candidates.len(),
        });
    }

    eprintln!("{}", prompt);
    for (i, candidate) in candidates.iter().enumerate() {
        let marker = if i + 1 == default_index { "*" } else { " " };
        eprintln!(" {}{:>3}) {}", marker, i + 1, candidate);
    }

    let input = prompter.read_line(&format!(
        "Select 1-{} [{}]",
        candidates.len(),
        default_index
    ))?;

    let index = parse_selection(&input, default_index, candidates.len()).ok_or_else(|| {
        DisambiguationError::InvalidSelection {
            input: input.trim().to_string(),
            count: candidates.len(),
        }
    })?;

    tracing::info!(selected = %candidates[index], "candidate chosen interactively");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{NonInteractive, ScriptedPrompter};

    const CANDIDATES: [&str; 3] = ["A", "B", "C"];

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("", 2, 3), Some(1));
        assert_eq!(parse_selection("  ", 1, 3), Some(0));
        assert_eq!(parse_selection("3", 1, 3), Some(2));
        assert_eq!(parse_selection(" 1 ", 1, 3), Some(0));
        assert_eq!(parse_selection("0", 1, 3), None);
        assert_eq!(parse_selection("4", 1, 3), None);
        assert_eq!(parse_selection("-1", 1, 3), None);
        assert_eq!(parse_selection("two", 1, 3), None);
        // A default outside the range is not silently accepted
        assert_eq!(parse_selection("", 5, 3), None);
    }

    #[test]
    fn test_non_interactive_never_guesses() {
        let mut prompter = NonInteractive;
        let err = choose(&mut prompter, "Pick", 1, &CANDIDATES).unwrap_err();
        assert!(matches!(err, DisambiguationError::NotInteractive { count: 3 }));
    }

    #[test]
    fn test_empty_input_selects_default() {
        let mut prompter = ScriptedPrompter::new([""]);
        assert_eq!(choose(&mut prompter, "Pick", 2, &CANDIDATES).unwrap(), 1);
    }

    #[test]
    fn test_explicit_selection() {
        let mut prompter = ScriptedPrompter::new(["3"]);
        assert_eq!(choose(&mut prompter, "Pick", 1, &CANDIDATES).unwrap(), 2);
        assert_eq!(prompter.asked(), ["Select 1-3 [1]"]);
    }

    #[test]
    fn test_invalid_selection_fails() {
        let mut prompter = ScriptedPrompter::new(["9"]);
        let err = choose(&mut prompter, "Pick", 1, &CANDIDATES).unwrap_err();
        assert!(matches!(err, DisambiguationError::InvalidSelection { ref input, count: 3 } if input == "9"));
    }

    #[test]
    fn test_no_candidates() {
        let mut prompter = ScriptedPrompter::new(["1"]);
        let empty: [&str; 0] = [];
        assert!(matches!(
            choose(&mut prompter, "Pick", 1, &empty),
            Err(DisambiguationError::NoCandidates)
        ));
        assert!(prompter.asked().is_empty());
    }
}
