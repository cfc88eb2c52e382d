// src/crawl/fetch.rs
// =============================================================================
// Fetches one page and classifies what happened.
//
// Instead of throwing and catching, every fetch ends in a PageOutcome:
// - Html: a 2xx HTML page, already re-decoded to a String
// - Skipped: nothing to do and nothing worth logging loudly (404, non-HTML)
// - Failed: a per-page error that gets logged before moving on
//
// Body bytes are decoded with the best charset we can find:
//   BOM -> Content-Type charset -> <meta> charset -> UTF-8 -> fallback
// =============================================================================

use super::error::PageError;
use encoding_rs::Encoding;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

/// Why a page was skipped without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// HTTP 404
    NotFound,
    /// Content-Type is not an HTML kind (holds the declared type)
    NotHtml(String),
}

/// Result of fetching one URL
#[derive(Debug)]
pub enum PageOutcome {
    /// Decoded HTML body
    Html(String),
    /// Silently skipped
    Skipped(SkipReason),
    /// Logged and skipped
    Failed(PageError),
}

// Fetches `url` and turns the response into a PageOutcome
//
// The client carries the timeout and User-Agent; `fallback` is the charset
// used when nothing else can be detected.
pub async fn fetch_page(client: &Client, url: &str, fallback: &'static Encoding) -> PageOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return PageOutcome::Failed(PageError::from_send(e)),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return PageOutcome::Skipped(SkipReason::NotFound);
    }
    if !status.is_success() {
        return PageOutcome::Failed(PageError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !is_html(&content_type) {
        return PageOutcome::Skipped(SkipReason::NotHtml(content_type));
    }

    match response.bytes().await {
        Ok(body) => PageOutcome::Html(decode_body(&body, &content_type, fallback)),
        Err(e) => PageOutcome::Failed(PageError::from_body(e)),
    }
}

// True for text/html and application/xhtml+xml content types
pub fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

// Decodes a body with the detected charset
pub fn decode_body(body: &[u8], content_type: &str, fallback: &'static Encoding) -> String {
    let encoding = detect_encoding(body, content_type, fallback);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

// Picks the charset for a body
pub fn detect_encoding(
    body: &[u8],
    content_type: &str,
    fallback: &'static Encoding,
) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) =
        charset_param(content_type).and_then(|l| Encoding::for_label(l.as_bytes()))
    {
        return encoding;
    }

    let head = &body[..body.len().min(1024)];
    if let Some(encoding) = meta_charset(head).and_then(|l| Encoding::for_label(l.as_bytes())) {
        return encoding;
    }

    if std::str::from_utf8(body).is_ok() {
        return encoding_rs::UTF_8;
    }

    fallback
}

// Reads the charset parameter of a Content-Type value
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

// Finds `charset=...` in the first bytes of a document
//
// Covers both <meta charset="x"> and
// <meta http-equiv="Content-Type" content="text/html; charset=x">.
fn meta_charset(head: &[u8]) -> Option<String> {
    let lower = head.to_ascii_lowercase();
    let needle = b"charset=";
    let start = lower
        .windows(needle.len())
        .position(|window| window == needle)?
        + needle.len();

    let rest = &lower[start..];
    let rest = rest
        .strip_prefix(b"\"")
        .or_else(|| rest.strip_prefix(b"'"))
        .unwrap_or(rest);

    let end = rest
        .iter()
        .position(|&c| matches!(c, b'"' | b'\'' | b';' | b'>' | b'/') || c.is_ascii_whitespace())
        .unwrap_or(rest.len());

    let label = std::str::from_utf8(&rest[..end]).ok()?;
    (!label.is_empty()).then(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::io::Write;
    use std::time::Duration;

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html(""));
    }

    #[test]
    fn test_header_charset_wins_over_meta() {
        let body = br#"<meta charset="shift_jis"><p>hi</p>"#;
        let encoding = detect_encoding(body, "text/html; charset=EUC-JP", encoding_rs::UTF_8);
        assert_eq!(encoding, encoding_rs::EUC_JP);
    }

    #[test]
    fn test_meta_charset() {
        let body = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS"></head>"#;
        assert_eq!(
            detect_encoding(body, "text/html", encoding_rs::UTF_8),
            encoding_rs::SHIFT_JIS
        );
        let body = br#"<meta charset='euc-jp'>"#;
        assert_eq!(
            detect_encoding(body, "text/html", encoding_rs::UTF_8),
            encoding_rs::EUC_JP
        );
    }

    #[test]
    fn test_undeclared_utf8_and_fallback() {
        let utf8 = "料金".as_bytes();
        assert_eq!(
            detect_encoding(utf8, "text/html", encoding_rs::SHIFT_JIS),
            encoding_rs::UTF_8
        );

        let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode("料金");
        assert_eq!(
            detect_encoding(&sjis, "text/html", encoding_rs::SHIFT_JIS),
            encoding_rs::SHIFT_JIS
        );
        assert_eq!(decode_body(&sjis, "text/html", encoding_rs::SHIFT_JIS), "料金");
    }

    #[test]
    fn test_bom_detection() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("円".as_bytes());
        assert_eq!(
            detect_encoding(&body, "text/html; charset=shift_jis", encoding_rs::SHIFT_JIS),
            encoding_rs::UTF_8
        );
        assert_eq!(decode_body(&body, "", encoding_rs::SHIFT_JIS), "円");
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mut server = Server::new_async().await;
        let (body, _, _) = encoding_rs::SHIFT_JIS.encode("<p>こんにちは</p>");
        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html; charset=Shift_JIS")
            .with_body(body.into_owned())
            .create_async()
            .await;

        let url = format!("{}/page", server.url());
        match fetch_page(&client(), &url, encoding_rs::UTF_8).await {
            PageOutcome::Html(html) => assert_eq!(html, "<p>こんにちは</p>"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_skipped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let outcome = fetch_page(&client(), &url, encoding_rs::UTF_8).await;
        assert!(matches!(outcome, PageOutcome::Skipped(SkipReason::NotFound)));
    }

    #[tokio::test]
    async fn test_fetch_server_error_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/broken", server.url());
        let outcome = fetch_page(&client(), &url, encoding_rs::UTF_8).await;
        assert!(matches!(
            outcome,
            PageOutcome::Failed(PageError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }

    #[tokio::test]
    async fn test_fetch_non_html_is_skipped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let url = format!("{}/data", server.url());
        let outcome = fetch_page(&client(), &url, encoding_rs::UTF_8).await;
        match outcome {
            PageOutcome::Skipped(SkipReason::NotHtml(kind)) => assert_eq!(kind, "application/json"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_fails() {
        // Port 9 (discard) on localhost is normally closed
        let outcome = fetch_page(&client(), "http://127.0.0.1:9/", encoding_rs::UTF_8).await;
        assert!(matches!(outcome, PageOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_fetch_slow_page_times_out() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/slow")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(b"<p>late</p>")
            })
            .create_async()
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let url = format!("{}/slow", server.url());
        let outcome = fetch_page(&client, &url, encoding_rs::UTF_8).await;
        assert!(matches!(outcome, PageOutcome::Failed(PageError::Timeout)));
    }
}
