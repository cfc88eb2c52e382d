// src/chat/context.rs
// =============================================================================
// Turns loaded FAQ records into the grounding text sent at the start of a
// chat session.
//
// Each usable record becomes one block:
//   質問: <question>
//   回答: <answer>
//   ---
// Blocks are appended until the character budget would be exceeded; the
// rest is dropped and the result is flagged as limited.
// =============================================================================

use crate::crawl::FaqRecord;
use tracing::warn;

/// Default character budget for the grounding text
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 950_000;

const CONTEXT_HEADER: &str = "あなたは親切なFAQアシスタントです。以下のFAQ情報を参考に、提供された情報のみに基づいてユーザーの質問に日本語で回答してください。FAQ情報の中に該当する答えが見つからない場合は、「関連する情報が見つかりませんでした。」と正直に回答してください。推測やFAQ情報以外の知識で回答を補完しないでください。

--- FAQ情報 ---
";

const CONTEXT_FOOTER: &str = "--- FAQ情報ここまで ---\n\n上記情報を記憶し、ユーザーからの質問に備えてください。";

/// The assembled grounding text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingContext {
    /// Header, FAQ blocks and footer
    pub text: String,
    /// Number of records that made it in
    pub included: usize,
    /// True when the budget cut the record list short
    pub limited: bool,
}

/// Builds grounding text under a character budget
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    max_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}

impl ContextBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    // Builds the context, or None when records exist but none could be used
    //
    // Records missing a question or an answer are skipped. Characters are
    // counted as Unicode scalar values.
    pub fn build(&self, records: &[FaqRecord]) -> Option<GroundingContext> {
        let mut used = CONTEXT_HEADER.chars().count() + CONTEXT_FOOTER.chars().count();
        let mut blocks = String::new();
        let mut included = 0;
        let mut limited = false;

        for record in records {
            if record.question.is_empty() || record.answer.is_empty() {
                continue;
            }

            let block = format!("質問: {}\n回答: {}\n---\n", record.question, record.answer);
            let block_len = block.chars().count();

            if used + block_len >= self.max_chars {
                warn!(included, "FAQ data exceeds the context budget, truncating");
                limited = true;
                break;
            }

            blocks.push_str(&block);
            used += block_len;
            included += 1;
        }

        if included == 0 && !records.is_empty() {
            warn!("no usable FAQ entries for the context");
            return None;
        }

        Some(GroundingContext {
            text: format!("{}{}{}", CONTEXT_HEADER, blocks, CONTEXT_FOOTER),
            included,
            limited,
        })
    }
}
