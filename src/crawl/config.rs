// src/crawl/config.rs
// =============================================================================
// Crawler settings.
//
// Everything that used to be a module-level constant (page ceiling, delay,
// timeout, client header, ignored extensions, markup markers) lives here and
// is handed to the Crawler when it is built. Tests build their own config
// with a zero delay and a tiny ceiling.
// =============================================================================

use encoding_rs::Encoding;
use std::time::Duration;

/// Safety stop for the number of unique pages processed in one run
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Browser-like identifying header sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Extensions of links that never point at HTML pages
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".css", ".js", ".xml", ".svg", ".ico",
    ".mp4", ".mp3", ".avi",
];

/// Where the question and the answer live on a FAQ page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupRules {
    /// Tag of the heading holding the question
    pub question_tag: String,
    /// Class marker on that heading
    pub question_class: String,
    /// Tag of the container holding the answer
    pub answer_tag: String,
    /// Identifier of that container
    pub answer_id: String,
}

impl Default for MarkupRules {
    fn default() -> Self {
        Self {
            question_tag: "h2".to_string(),
            question_class: "faq_qstCont_ttl".to_string(),
            answer_tag: "div".to_string(),
            answer_id: "faq_answer_contents".to_string(),
        }
    }
}

impl MarkupRules {
    // CSS selector for the question heading, e.g. h2[class~="faq_qstCont_ttl"]
    //
    // Markers go into quoted attribute values, so "." or ":" in a marker is
    // matched literally instead of being read as CSS syntax.
    pub fn question_selector(&self) -> String {
        format!(
            "{}[class~={}]",
            self.question_tag,
            css_string(&self.question_class)
        )
    }

    // CSS selector for the answer container, e.g. div[id="faq_answer_contents"]
    pub fn answer_selector(&self) -> String {
        format!("{}[id={}]", self.answer_tag, css_string(&self.answer_id))
    }
}

// Quotes a value as a CSS string literal
fn css_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\a "),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Configuration for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of unique pages to process
    pub max_pages: usize,

    /// Pause before every fetch
    pub request_delay: Duration,

    /// Timeout for a single fetch
    pub request_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,

    /// Lowercase extensions (with the dot) whose links are dropped
    pub ignored_extensions: Vec<String>,

    /// Question/answer markers
    pub markup: MarkupRules,

    /// Charset used when a page declares none and is not valid UTF-8
    pub fallback_encoding: &'static Encoding,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            request_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ignored_extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            markup: MarkupRules::default(),
            fallback_encoding: encoding_rs::SHIFT_JIS,
        }
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the page ceiling
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the pause before each fetch
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.config.request_delay = delay;
        self
    }

    /// Set the per-fetch timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Replace the ignored extension list
    pub fn ignored_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ignored_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    /// Set the question/answer markers
    pub fn markup(mut self, markup: MarkupRules) -> Self {
        self.config.markup = markup;
        self
    }

    /// Set the fallback charset
    pub fn fallback_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.config.fallback_encoding = encoding;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_pages, 10_000);
        assert_eq!(config.request_delay, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.ignored_extensions.len(), 14);
        assert!(config.ignored_extensions.contains(&".pdf".to_string()));
    }

    #[test]
    fn test_builder_lowercases_extensions() {
        let config = CrawlerConfig::builder()
            .max_pages(5)
            .request_delay(Duration::ZERO)
            .ignored_extensions([".PDF", ".Docx"])
            .build();
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.ignored_extensions, vec![".pdf", ".docx"]);
    }

    #[test]
    fn test_markup_selectors() {
        let rules = MarkupRules::default();
        assert_eq!(rules.question_selector(), r#"h2[class~="faq_qstCont_ttl"]"#);
        assert_eq!(rules.answer_selector(), r#"div[id="faq_answer_contents"]"#);
    }

    #[test]
    fn test_markers_are_quoted() {
        let rules = MarkupRules {
            question_class: r#"a"b"#.to_string(),
            answer_id: r"c\d".to_string(),
            ..MarkupRules::default()
        };
        assert_eq!(rules.question_selector(), r#"h2[class~="a\"b"]"#);
        assert_eq!(rules.answer_selector(), r#"div[id="c\\d"]"#);
    }
}
