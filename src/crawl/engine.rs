// src/crawl/engine.rs
// =============================================================================
// The crawl loop.
//
// How it works:
// 1. Normalize the start URL; its host becomes the only site we crawl
// 2. Seed a FIFO queue with it
// 3. Pop the oldest URL, skip it if already visited, otherwise mark it
// 4. Wait the politeness delay, fetch, extract the record and links
// 5. Append in-site, unvisited links to the back of the queue
// 6. Stop when the queue is empty or the page ceiling is reached
//
// One page at a time, no concurrency: the queue, the visited set and the
// record list all belong to this loop. A failing page is logged and counted,
// never fatal. Only a bad start URL ends the crawl early.
// =============================================================================

use super::config::CrawlerConfig;
use super::error::{CrawlError, PageError};
use super::extract::{Extraction, FaqExtractor};
use super::fetch::{fetch_page, PageOutcome, SkipReason};
use super::url::{authority, normalize};
use super::FaqRecord;
use crate::store;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::{debug, info, warn};

// Progress is logged every this many processed pages
const PROGRESS_INTERVAL: usize = 10;

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every reachable in-site page was processed
    Exhausted,
    /// The page ceiling was hit first
    PageLimit,
}

/// Everything one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// FAQ records in discovery order
    pub records: Vec<FaqRecord>,
    /// Number of unique pages dequeued and processed
    pub pages_processed: usize,
    /// Processed URLs, in processing order
    pub visited: Vec<String>,
    /// How the loop ended
    pub stop: StopReason,
}

/// A configured crawler with its HTTP client and compiled selectors
pub struct Crawler {
    config: CrawlerConfig,
    client: Client,
    extractor: FaqExtractor,
}

impl Crawler {
    // Builds the HTTP client and the extractor from the config
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let extractor = FaqExtractor::new(&config.markup, &config.ignored_extensions)?;

        Ok(Self {
            config,
            client,
            extractor,
        })
    }

    // Crawls breadth-first from `start_url`
    //
    // Returns Err only when the start URL is unusable; page failures are
    // logged and the crawl continues.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlReport, CrawlError> {
        let start = normalize(start_url, start_url)
            .ok_or_else(|| CrawlError::InvalidStartUrl(start_url.to_string()))?;
        let target_site = authority(&start)
            .ok_or_else(|| CrawlError::InvalidStartUrl(start_url.to_string()))?;

        info!(
            site = %target_site,
            start = %start,
            max_pages = self.config.max_pages,
            question = %self.config.markup.question_selector(),
            answer = %self.config.markup.answer_selector(),
            "starting crawl"
        );

        let mut frontier = VecDeque::from([start]);
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut records = Vec::new();

        while order.len() < self.config.max_pages {
            let Some(url) = frontier.pop_front() else {
                break;
            };

            if visited.contains(&url) {
                continue;
            }
            visited.insert(url.clone());
            order.push(url.clone());

            if order.len() % PROGRESS_INTERVAL == 0 {
                info!(
                    processed = order.len(),
                    records = records.len(),
                    queued = frontier.len(),
                    "crawl progress"
                );
            }

            let Some(extraction) = self.process_page(&url).await else {
                continue;
            };

            if let Some(record) = extraction.record {
                debug!(url = %url, question = %record.question, "found FAQ entry");
                records.push(record);
            }

            for link in extraction.links {
                if visited.contains(&link) {
                    continue;
                }
                if authority(&link).as_deref() == Some(target_site.as_str()) {
                    frontier.push_back(link);
                }
            }
        }

        let stop = if order.len() >= self.config.max_pages {
            warn!(max_pages = self.config.max_pages, "page limit reached, stopping crawl");
            StopReason::PageLimit
        } else {
            info!("no more URLs to visit, crawl finished");
            StopReason::Exhausted
        };

        info!(
            pages = order.len(),
            records = records.len(),
            "crawl complete"
        );

        Ok(CrawlReport {
            records,
            pages_processed: order.len(),
            visited: order,
            stop,
        })
    }

    // Waits, fetches and extracts one page
    //
    // None means the page produced nothing to follow (skipped or failed).
    async fn process_page(&self, url: &str) -> Option<Extraction> {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        match fetch_page(&self.client, url, self.config.fallback_encoding).await {
            PageOutcome::Html(html) => Some(self.extractor.extract_html(&html, url)),
            PageOutcome::Skipped(SkipReason::NotFound) => {
                debug!(url, "not found, skipping");
                None
            }
            PageOutcome::Skipped(SkipReason::NotHtml(kind)) => {
                debug!(url, content_type = %kind, "not HTML, skipping");
                None
            }
            PageOutcome::Failed(PageError::Timeout) => {
                warn!(url, "request timed out");
                None
            }
            PageOutcome::Failed(e) => {
                warn!(url, error = %e, "failed to fetch page");
                None
            }
        }
    }
}

// Crawls and writes the records to `output`
//
// Returns Ok(true) when records were saved or when there was nothing to save
// (no file is written in that case), Ok(false) when saving failed.
pub async fn crawl_and_save(
    config: CrawlerConfig,
    start_url: &str,
    output: &Path,
) -> Result<bool, CrawlError> {
    let crawler = Crawler::new(config)?;
    let report = crawler.crawl(start_url).await?;

    debug!(
        stop = ?report.stop,
        visited = report.visited.len(),
        pages = report.pages_processed,
        "crawl report"
    );

    if report.records.is_empty() {
        info!("no FAQ entries found, nothing written");
        return Ok(true);
    }

    Ok(store::save(&report.records, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::io::Write;
    use std::time::Duration;

    fn test_config(max_pages: usize) -> CrawlerConfig {
        CrawlerConfig::builder()
            .max_pages(max_pages)
            .request_delay(Duration::ZERO)
            .request_timeout(Duration::from_secs(5))
            .build()
    }

    async fn html_page(server: &mut ServerGuard, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body)
            .create_async()
            .await
    }

    const FAQ_B: &str = r#"
        <html><body>
          <a href="/">home</a>
          <h2 class="faq_qstCont_ttl">料金は?</h2>
          <div id="faq_answer_contents"><p>1000円です</p></div>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_invalid_start_url() {
        let crawler = Crawler::new(test_config(10)).unwrap();
        let result = crawler.crawl("not a url").await;
        assert!(matches!(result, Err(CrawlError::InvalidStartUrl(_))));

        let result = crawler.crawl("mailto:help@example.test").await;
        assert!(matches!(result, Err(CrawlError::InvalidStartUrl(_))));
    }

    #[tokio::test]
    async fn test_three_page_site() {
        let mut server = Server::new_async().await;
        let root = html_page(
            &mut server,
            "/",
            r#"<a href="/b">B</a> <a href="/c.pdf">C</a> <a href="/b?from=top">B again</a>"#,
        )
        .await;
        let b = html_page(&mut server, "/b", FAQ_B).await;
        let c = server
            .mock("GET", "/c.pdf")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let base = server.url();
        let start = format!("{}/", base);
        let crawler = Crawler::new(test_config(100)).unwrap();
        let report = crawler.crawl(&start).await.unwrap();

        assert_eq!(report.visited, vec![start.clone(), format!("{}/b", base)]);
        assert_eq!(report.pages_processed, 2);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(
            report.records,
            vec![FaqRecord {
                question: "料金は?".to_string(),
                answer: "1000円です".to_string(),
                url: format!("{}/b", base),
            }]
        );

        root.assert_async().await;
        b.assert_async().await;
        c.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_and_save_writes_records() {
        let mut server = Server::new_async().await;
        let _m2 = html_page(&mut server, "/", r#"<a href="/b">B</a> <a href="/c.pdf">C</a>"#).await;
        let _m3 = html_page(&mut server, "/b", FAQ_B).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("faq.json");
        let start = format!("{}/", server.url());

        let saved = crawl_and_save(test_config(100), &start, &output).await.unwrap();
        assert!(saved);

        let loaded = store::load(&output).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].question, "料金は?");
        assert_eq!(loaded[0].answer, "1000円です");
        assert_eq!(loaded[0].url, format!("{}/b", server.url()));
    }

    #[tokio::test]
    async fn test_empty_result_writes_nothing() {
        let mut server = Server::new_async().await;
        let _m4 = html_page(&mut server, "/", r#"<a href="/about">about</a>"#).await;
        let _m5 = html_page(&mut server, "/about", "<p>No FAQ here</p>").await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("faq.json");
        let start = format!("{}/", server.url());

        let saved = crawl_and_save(test_config(100), &start, &output).await.unwrap();
        assert!(saved);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_page_limit_on_infinite_site() {
        let mut server = Server::new_async().await;
        // Every page links one level deeper: /, /n/, /n/n/, ...
        let _m6 = server
            .mock("GET", Matcher::Regex(r"^/".to_string()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="n/">deeper</a>"#)
            .create_async()
            .await;

        let start = format!("{}/", server.url());
        let crawler = Crawler::new(test_config(5)).unwrap();
        let report = crawler.crawl(&start).await.unwrap();

        assert_eq!(report.pages_processed, 5);
        assert_eq!(report.visited.len(), 5);
        assert_eq!(report.stop, StopReason::PageLimit);
        assert_eq!(report.visited[4], format!("{}/n/n/n/n/", server.url()));
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_skipped() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/gone">gone</a> <a href="/error">error</a>
               <a href="/feed">feed</a> <a href="/ok">ok</a>"#,
        )
        .await;
        let _m7 = server.mock("GET", "/gone").with_status(404).create_async().await;
        let _m8 = server.mock("GET", "/error").with_status(500).create_async().await;
        let _m9 = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(r#"<a href="/hidden">never followed</a>"#)
            .create_async()
            .await;
        let _m10 = html_page(&mut server, "/ok", FAQ_B).await;

        let start = format!("{}/", server.url());
        let crawler = Crawler::new(test_config(100)).unwrap();
        let report = crawler.crawl(&start).await.unwrap();

        assert_eq!(report.pages_processed, 5);
        assert_eq!(report.records.len(), 1);
        assert!(!report.visited.iter().any(|u| u.ends_with("/hidden")));
    }

    #[tokio::test]
    async fn test_timed_out_page_is_skipped() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/slow">slow</a> <a href="/b">b</a>"#,
        )
        .await;
        let slow = server
            .mock("GET", "/slow")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(br#"<a href="/never">never</a>"#)
            })
            .create_async()
            .await;
        let _b = html_page(&mut server, "/b", FAQ_B).await;

        let base = server.url();
        let config = CrawlerConfig::builder()
            .max_pages(100)
            .request_delay(Duration::ZERO)
            .request_timeout(Duration::from_millis(100))
            .build();
        let crawler = Crawler::new(config).unwrap();
        let report = crawler.crawl(&format!("{}/", base)).await.unwrap();

        assert_eq!(
            report.visited,
            vec![
                format!("{}/", base),
                format!("{}/slow", base),
                format!("{}/b", base),
            ]
        );
        assert_eq!(report.pages_processed, 3);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].url, format!("{}/b", base));
        slow.assert_async().await;
    }

    #[tokio::test]
    async fn test_visited_is_unique_and_on_site() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/a">a</a> <a href="/b">b</a>
               <a href="https://elsewhere.test/x">off-site</a>"#,
        )
        .await;
        let _m11 = html_page(&mut server, "/a", r#"<a href="/b">b</a> <a href="/">home</a>"#).await;
        let _m12 = html_page(
            &mut server,
            "/b",
            r#"<a href="/a#top">a</a> <a href="/a?x=1">a</a>"#,
        )
        .await;

        let start = format!("{}/", server.url());
        let crawler = Crawler::new(test_config(100)).unwrap();
        let report = crawler.crawl(&start).await.unwrap();

        let unique: HashSet<_> = report.visited.iter().collect();
        assert_eq!(unique.len(), report.visited.len());
        assert_eq!(report.visited.len(), report.pages_processed);
        assert_eq!(report.pages_processed, 3);

        let site = authority(&start).unwrap();
        assert!(report
            .visited
            .iter()
            .all(|u| authority(u).as_deref() == Some(site.as_str())));
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let mut server = Server::new_async().await;
        let _m13 = html_page(&mut server, "/", r#"<a href="/a">a</a> <a href="/b">b</a>"#).await;
        let _m14 = html_page(&mut server, "/a", r#"<a href="/a/deep">deep</a>"#).await;
        let _m15 = html_page(&mut server, "/b", "").await;
        let _m16 = html_page(&mut server, "/a/deep", "").await;

        let base = server.url();
        let crawler = Crawler::new(test_config(100)).unwrap();
        let report = crawler.crawl(&format!("{}/", base)).await.unwrap();

        assert_eq!(
            report.visited,
            vec![
                format!("{}/", base),
                format!("{}/a", base),
                format!("{}/b", base),
                format!("{}/a/deep", base),
            ]
        );
    }
}
