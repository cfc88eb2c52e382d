// src/console.rs
// =============================================================================
// Line-based prompts on stdin.
//
// One Console owns the input for the whole run so buffered lines are never
// lost between prompts. Tests build it from a byte slice instead of stdin.
// =============================================================================

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    // Prints `prompt` and reads one line; None at end of input
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    // Asks a y/n question; only "y" (any case) counts as yes
    pub async fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt).await?;
        Ok(matches!(answer, Some(a) if a.trim().eq_ignore_ascii_case("y")))
    }
}
