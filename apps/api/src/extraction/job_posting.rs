//! Job descriptions pasted as a bare URL are fetched and reduced to readable text.

use std::time::Duration;

use htmd::HtmlToMarkdown;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};

use crate::extraction::ExtractionError;

const FETCH_TIMEOUT_SECS: u64 = 10;
const MAX_JOB_DESCRIPTION_CHARS: usize = 5000;
/// Pages are read up to this many bytes; the rest is never buffered.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "svg", "iframe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobDescriptionSource {
    Text,
    Url,
}

/// HTTP client for job-posting fetches. Separate from the LLM client: shorter
/// timeout, browser-like user agent.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
}

/// True when the input is exactly one http(s) URL with no whitespace around or inside it.
pub fn is_url_only(text: &str) -> bool {
    let text = text.trim();
    let rest = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"));
    matches!(rest, Some(rest) if !rest.is_empty() && !rest.chars().any(char::is_whitespace))
}

/// Returns the job description text, fetching it first when the input is a bare URL.
pub async fn resolve_job_description(
    client: &Client,
    input: &str,
) -> Result<(String, JobDescriptionSource), ExtractionError> {
    if !is_url_only(input) {
        return Ok((input.trim().to_string(), JobDescriptionSource::Text));
    }

    let url = input.trim();
    info!("Fetching job description from {url}");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ExtractionError::Fetch(e.to_string()))?;
    let body = read_capped(response, MAX_PAGE_BYTES)
        .await
        .map_err(|e| ExtractionError::Fetch(e.to_string()))?;

    let text = html_to_text(&String::from_utf8_lossy(&body))?;
    if text.is_empty() {
        return Err(ExtractionError::Empty(url.to_string()));
    }
    Ok((text, JobDescriptionSource::Url))
}

async fn read_capped(mut response: Response, cap: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = cap - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!("Page body truncated at {cap} bytes");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Readable page text (Markdown) without scripts, styles or blank lines, capped.
pub fn html_to_text(html: &str) -> Result<String, ExtractionError> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();
    let markdown = converter
        .convert(html)
        .map_err(|e| ExtractionError::Fetch(format!("unreadable page: {e}")))?;

    let text = markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(truncate_chars(&text, MAX_JOB_DESCRIPTION_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use axum::{http::StatusCode, response::Html, response::IntoResponse, routing::get, Router};

    const POSTING: &str = r#"<html><head><title>Careers</title>
        <style>.x{color:red}</style></head>
        <body><script>track();</script>
        <h1>Senior Rust Engineer</h1>
        <div class="job-description"><p>Build &amp; ship services. It&rsquo;s remote.</p>

        <ul><li>Five years of Rust</li></ul></div></body></html>"#;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[test]
    fn test_is_url_only() {
        assert!(is_url_only("https://jobs.example.com/posting/123"));
        assert!(is_url_only("  http://example.com/job?id=4  \n"));
        assert!(!is_url_only("https://example.com/job and more text"));
        assert!(!is_url_only("Senior Engineer\nhttps://example.com"));
        assert!(!is_url_only("ftp://example.com/job"));
        assert!(!is_url_only("https://"));
    }

    #[test]
    fn test_html_to_text_drops_scripts_and_blank_lines() {
        let text = html_to_text(POSTING).unwrap();
        assert!(text.contains("Senior Rust Engineer"), "{text}");
        assert!(text.contains("ship services."), "{text}");
        assert!(text.contains("It\u{2019}s remote."), "{text}");
        assert!(text.contains("Five years of Rust"), "{text}");
        assert!(!text.contains("track()"), "{text}");
        assert!(!text.contains("color:red"), "{text}");
        assert!(!text.lines().any(|line| line.trim().is_empty()), "{text}");
    }

    #[test]
    fn test_html_to_text_keeps_literal_angle_brackets() {
        let text =
            html_to_text("<p>Salary 3 < 5 years experience</p><p>Rust required</p>").unwrap();
        assert!(text.contains("5 years experience"), "{text}");
        assert!(text.contains("Rust required"), "{text}");
    }

    #[test]
    fn test_html_to_text_decodes_numeric_entities() {
        let text = html_to_text("<p>Team&#8217;s stack</p>").unwrap();
        assert!(text.contains("Team\u{2019}s stack"), "{text}");
    }

    #[test]
    fn test_html_to_text_truncates() {
        let html = format!("<p>{}</p>", "é".repeat(6000));
        let text = html_to_text(&html).unwrap();
        assert_eq!(text.chars().count(), MAX_JOB_DESCRIPTION_CHARS + 3);
        assert!(text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_plain_text_is_not_fetched() {
        let client = http_client().unwrap();
        let (text, source) = resolve_job_description(&client, "  Backend role, Rust  ")
            .await
            .unwrap();
        assert_eq!(text, "Backend role, Rust");
        assert_eq!(source, JobDescriptionSource::Text);
    }

    #[tokio::test]
    async fn test_url_is_fetched_and_reduced() {
        let base = serve(Router::new().route("/jobs/42", get(|| async { Html(POSTING) }))).await;
        let client = http_client().unwrap();

        let (text, source) = resolve_job_description(&client, &format!("{base}/jobs/42"))
            .await
            .unwrap();

        assert_eq!(source, JobDescriptionSource::Url);
        assert!(text.contains("Senior Rust Engineer"), "{text}");
        assert!(!text.contains("track()"), "{text}");
    }

    #[tokio::test]
    async fn test_missing_page_is_fetch_error_and_400() {
        let base = serve(Router::new()).await;
        let client = http_client().unwrap();

        let err = resolve_job_description(&client, &format!("{base}/jobs/missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Fetch(_)), "{err}");
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_fetch_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = http_client().unwrap();

        let err = resolve_job_description(&client, &format!("http://{addr}/job"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Fetch(_)), "{err}");
    }

    #[tokio::test]
    async fn test_page_body_is_read_up_to_cap() {
        let base = serve(
            Router::new().route("/big", get(|| async { "x".repeat(64 * 1024) })),
        )
        .await;
        let response = http_client()
            .unwrap()
            .get(format!("{base}/big"))
            .send()
            .await
            .unwrap();

        let body = read_capped(response, 1024).await.unwrap();

        assert_eq!(body.len(), 1024);
    }
}
