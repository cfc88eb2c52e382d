// src/chat/mod.rs
// =============================================================================
// Question answering over the crawled FAQ data.
//
// Submodules:
// - context: builds the grounding text under a character budget
// - gemini: the model API client
// - session: multi-turn history and token counters
//
// run_interactive is the read-ask-print loop used by the `chat` command.
// =============================================================================

mod context;
mod gemini;
mod session;

pub use context::{ContextBuilder, DEFAULT_MAX_CONTEXT_CHARS};
pub use gemini::{ChatError, GeminiClient, DEFAULT_MODEL};
pub use session::ChatSession;

use crate::console::Console;
use anyhow::Result;
use tokio::io::AsyncBufRead;
use tracing::{error, warn};

// Reads questions until "quit"/"exit" or end of input
//
// A failed question is reported and the loop keeps going.
pub async fn run_interactive<R>(console: &mut Console<R>, session: &mut ChatSession) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let Some(line) = console.ask("\nQuestion: ").await? else {
            break;
        };

        let question = line.trim();
        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        println!("\nAsking the model...");
        match session.ask(question).await {
            Ok(answer) => {
                println!("\nAnswer:");
                println!("{}", answer);
            }
            Err(ChatError::RateLimited(message)) => {
                warn!(%message, "rate limited by the model API");
                println!("The model API rate limit was reached. Please wait and try again.");
            }
            Err(e) => {
                error!(error = %e, "failed to get an answer");
                println!("Could not get an answer: {}", e);
            }
        }
    }

    Ok(())
}
