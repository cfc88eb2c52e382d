// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Two subcommands:
// - crawl: collect FAQ entries from a help-center site into a JSON file
// - chat:  answer questions with Gemini, grounded on that file
//
// Crawl settings are shared through the CrawlArgs group so `chat` can run a
// (re)crawl with the same options.
// =============================================================================

use crate::chat::{DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MODEL};
use crate::crawl::{
    CrawlerConfig, MarkupRules, DEFAULT_IGNORED_EXTENSIONS, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT,
};
use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;
use std::path::PathBuf;
use std::time::Duration;

/// Help-center root used when no start URL is given
pub const DEFAULT_START_URL: &str = "https://help.openlogi.com/";

/// FAQ data file shared by both subcommands
pub const DEFAULT_DATA_FILE: &str = "faq_data.json";

#[derive(Parser, Debug)]
#[command(
    name = "faq-harvester",
    version,
    about = "Collect FAQ entries from a help-center site and chat over them",
    long_about = "faq-harvester crawls a help-center site breadth-first, extracts question/answer \
                  pages into a JSON file, and runs an interactive Gemini chat grounded on that file."
)]
pub struct Cli {
    /// Show debug logs (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a site and save its FAQ entries
    ///
    /// Example: faq-harvester crawl https://help.example.com/ --output faq.json
    Crawl {
        /// Start URL; prompts for one (with a default) when omitted
        start_url: Option<String>,

        /// Where to write the FAQ data
        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        output: PathBuf,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Chat with Gemini about the collected FAQ entries
    ///
    /// Example: GEMINI_API_KEY=... faq-harvester chat --data faq.json
    Chat {
        /// FAQ data file to load (offers to crawl when missing)
        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        data: PathBuf,

        /// Gemini model name
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Character budget for the grounding context
        #[arg(long, default_value_t = DEFAULT_MAX_CONTEXT_CHARS)]
        max_context_chars: usize,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

/// Options that shape a crawl
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Stop after this many unique pages
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Pause before each request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Timeout for each request, in seconds
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    /// Class marker of the question heading
    #[arg(long, default_value = "faq_qstCont_ttl")]
    pub question_class: String,

    /// Identifier of the answer container
    #[arg(long, default_value = "faq_answer_contents")]
    pub answer_id: String,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Extra link extension to skip, e.g. --ignore-extension .csv (repeatable)
    #[arg(long = "ignore-extension", value_name = "EXT")]
    pub ignore_extensions: Vec<String>,

    /// Charset for pages that declare none and are not valid UTF-8
    #[arg(long, default_value = "shift_jis", value_parser = parse_encoding)]
    pub fallback_encoding: &'static Encoding,
}

// Resolves a charset label such as "shift_jis" or "euc-jp"
fn parse_encoding(label: &str) -> Result<&'static Encoding, String> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| format!("unknown charset: {}", label))
}

impl CrawlArgs {
    pub fn to_config(&self) -> CrawlerConfig {
        CrawlerConfig::builder()
            .max_pages(self.max_pages)
            .request_delay(Duration::from_millis(self.delay_ms))
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone())
            .ignored_extensions(
                DEFAULT_IGNORED_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .chain(self.ignore_extensions.iter().cloned()),
            )
            .markup(MarkupRules {
                question_class: self.question_class.clone(),
                answer_id: self.answer_id.clone(),
                ..MarkupRules::default()
            })
            .fallback_encoding(self.fallback_encoding)
            .build()
    }
}
