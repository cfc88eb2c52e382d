// src/crawl/extract.rs
// =============================================================================
// Pulls a question/answer record and same-site links out of a parsed page.
//
// Record extraction:
// - question: text of the first heading matching the question selector
//   (e.g. <h2 class="faq_qstCont_ttl">)
// - answer: visible text nodes of the first container matching the answer
//   selector (e.g. <div id="faq_answer_contents">), one per line, blank lines
//   collapsed; script, style, template and noscript contents are skipped
// - a record exists only when both are non-empty
//
// Link extraction:
// - every <a href>, normalized against the page URL
// - kept only when it stays on the page's own host
// - dropped when the path ends with an ignored (non-HTML) extension
//
// Nothing here does I/O or returns errors: odd markup just produces no record
// and fewer links.
// =============================================================================

use super::config::MarkupRules;
use super::error::CrawlError;
use super::url::{authority, lowercase_path, normalize};
use super::FaqRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

// Elements whose text is never rendered as page content
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// What one page yielded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The FAQ entry, if the page has the expected markup
    pub record: Option<FaqRecord>,
    /// Unique same-site links in the order they first appear
    pub links: Vec<String>,
}

/// Page extractor with its selectors compiled once
#[derive(Debug, Clone)]
pub struct FaqExtractor {
    question: Selector,
    answer: Selector,
    anchors: Selector,
    ignored_extensions: Vec<String>,
    blank_lines: Regex,
}

impl FaqExtractor {
    // Compiles the markup markers into selectors
    //
    // Fails only when a marker cannot be turned into a CSS selector.
    pub fn new(markup: &MarkupRules, ignored_extensions: &[String]) -> Result<Self, CrawlError> {
        Ok(Self {
            question: parse_selector(&markup.question_selector())?,
            answer: parse_selector(&markup.answer_selector())?,
            anchors: parse_selector("a[href]")?,
            ignored_extensions: ignored_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            // Constant pattern, always compiles
            blank_lines: Regex::new(r"\n\s*\n+").expect("blank line pattern is valid"),
        })
    }

    // Parses raw HTML and extracts from it
    pub fn extract_html(&self, html: &str, page_url: &str) -> Extraction {
        let document = Html::parse_document(html);
        self.extract(&document, page_url)
    }

    // Extracts the record and candidate links from an already parsed page
    pub fn extract(&self, document: &Html, page_url: &str) -> Extraction {
        Extraction {
            record: self.extract_record(document, page_url),
            links: self.extract_links(document, page_url),
        }
    }

    fn extract_record(&self, document: &Html, page_url: &str) -> Option<FaqRecord> {
        let question = document
            .select(&self.question)
            .next()
            .map(|heading| visible_text(heading).map(str::trim).collect::<String>())
            .unwrap_or_default();

        let answer = document
            .select(&self.answer)
            .next()
            .map(|container| self.answer_text(container))
            .unwrap_or_default();

        if question.is_empty() || answer.is_empty() {
            return None;
        }

        Some(FaqRecord {
            question,
            answer,
            url: page_url.to_string(),
        })
    }

    // One line per non-blank text node, runs of blank lines folded to one
    fn answer_text(&self, container: ElementRef<'_>) -> String {
        let joined = visible_text(container)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        self.blank_lines
            .replace_all(&joined, "\n")
            .trim()
            .to_string()
    }

    fn extract_links(&self, document: &Html, page_url: &str) -> Vec<String> {
        let Some(page_site) = authority(page_url) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let Some(link) = normalize(page_url, href) else {
                continue;
            };

            if authority(&link).as_deref() != Some(page_site.as_str()) {
                continue;
            }

            if self.has_ignored_extension(&link) {
                continue;
            }

            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        links
    }

    fn has_ignored_extension(&self, url: &str) -> bool {
        match lowercase_path(url) {
            Some(path) => self
                .ignored_extensions
                .iter()
                .any(|ext| path.ends_with(ext.as_str())),
            None => true,
        }
    }
}

// Text nodes under `root`, minus those inside hidden elements
fn visible_text<'a>(root: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    root.descendants().filter_map(move |node| {
        let text = node.value().as_text()?;
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|element| HIDDEN_TAGS.contains(&element.name()));
        if hidden {
            None
        } else {
            Some(&**text)
        }
    })
}

fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    // Display on scraper's parse errors can panic on some tokens; Debug cannot
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}
