// src/chat/session.rs
// =============================================================================
// A multi-turn chat grounded on the FAQ context.
//
// The session keeps the full history and resends it on every turn. The first
// turn ("priming") carries the grounding text; its token usage is tracked
// apart from the question/answer turns so the final report can show both.
// =============================================================================

use super::gemini::{ChatError, Content, GeminiClient, ModelReply, UsageMetadata};
use std::fmt;
use tracing::warn;

const READY_INSTRUCTION: &str =
    "上記の内容を理解しましたか？準備ができたら「準備完了」とだけ答えてください。";

/// Token counters for a whole session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    /// Prompt tokens of the priming turn
    pub initial_prompt: u64,
    /// Response tokens of the priming turn
    pub initial_response: u64,
    /// Prompt tokens summed over question turns
    pub qa_prompt: u64,
    /// Response tokens summed over question turns
    pub qa_response: u64,
    /// Total tokens reported for the session
    pub total: u64,
}

impl fmt::Display for UsageTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Token usage:")?;
        writeln!(f, "  Initial context:")?;
        writeln!(f, "    - prompt:   {}", self.initial_prompt)?;
        writeln!(f, "    - response: {}", self.initial_response)?;
        writeln!(f, "  Questions:")?;
        writeln!(f, "    - prompt total:   {}", self.qa_prompt)?;
        writeln!(f, "    - response total: {}", self.qa_response)?;
        writeln!(f, "  --------------------")?;
        write!(f, "  Session total: {} tokens", self.total)
    }
}

#[derive(Clone, Copy)]
enum Turn {
    Priming,
    Question,
}

/// Conversation state on top of a GeminiClient
pub struct ChatSession {
    client: GeminiClient,
    history: Vec<Content>,
    usage: UsageTotals,
}

impl ChatSession {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            history: Vec::new(),
            usage: UsageTotals::default(),
        }
    }

    // Sends the grounding context and asks the model to acknowledge it
    pub async fn prime(&mut self, context: &str) -> Result<String, ChatError> {
        let message = format!("{}\n\n{}", context, READY_INSTRUCTION);
        self.send(message, Turn::Priming).await
    }

    // Asks one question and returns the answer text
    pub async fn ask(&mut self, question: &str) -> Result<String, ChatError> {
        self.send(question.to_string(), Turn::Question).await
    }

    pub fn usage(&self) -> UsageTotals {
        self.usage
    }

    async fn send(&mut self, message: String, turn: Turn) -> Result<String, ChatError> {
        self.history.push(Content::user(message));

        match self.client.generate(&self.history).await {
            Ok(ModelReply { text, usage }) => {
                self.record_usage(turn, usage);
                self.history.push(Content::model(text.clone()));
                Ok(text)
            }
            Err(e) => {
                // A failed turn must not stay in the history
                self.history.pop();
                Err(e)
            }
        }
    }

    fn record_usage(&mut self, turn: Turn, usage: Option<UsageMetadata>) {
        let Some(usage) = usage else {
            warn!("token usage not reported for this call");
            return;
        };

        match turn {
            Turn::Priming => {
                self.usage.initial_prompt = usage.prompt_token_count;
                self.usage.initial_response = usage.candidates_token_count;
            }
            Turn::Question => {
                self.usage.qa_prompt += usage.prompt_token_count;
                self.usage.qa_response += usage.candidates_token_count;
            }
        }
        self.usage.total += usage.total_token_count;
    }
}

#[cfg(test)]
impl ChatSession {
    fn history_len(&self) -> usize {
        self.history.len()
    }
}
