//! Operator confirmation prompts

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// The only answer accepted as "yes" (case-insensitive)
pub const AFFIRMATIVE_ANSWER: &str = "y";

const SEPARATOR_WIDTH: usize = 100;

/// Line printed above every prompt
pub fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(AFFIRMATIVE_ANSWER)
}

/// Asks the operator a yes/no question
#[async_trait]
pub trait Confirm: Send {
    /// `Ok(true)` only for an affirmative answer
    async fn confirm(&mut self, question: &str) -> std::io::Result<bool>;
}

/// Prompt on stdout, answer read from stdin
///
/// End of input counts as a decline.
pub struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Confirm for StdinPrompt {
    async fn confirm(&mut self, question: &str) -> std::io::Result<bool> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{question} ").as_bytes()).await?;
        stdout.flush().await?;

        let answer = self.lines.next_line().await?;
        Ok(answer.as_deref().map_or(false, is_affirmative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_y_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative(" y\n"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
    }

    #[test]
    fn test_separator_width() {
        let line = separator();
        assert_eq!(line.len(), 100);
        assert!(line.chars().all(|c| c == '='));
    }
}
