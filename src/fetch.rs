//! Attachment fetcher — remote URL to in-memory media payload.

use reqwest::header::CONTENT_TYPE;
use tracing::warn;

use wagate_core::error::GateError;
use wagate_core::message::Attachment;

/// Filename used when the URL path has no final segment.
const DEFAULT_FILENAME: &str = "image.jpg";

/// MIME type used when the origin server declares none.
const DEFAULT_MIME: &str = "application/octet-stream";

/// Fetch a remote URL and wrap the bytes into an [`Attachment`].
///
/// Every failure mode (bad URL, network error, non-success status, body
/// read) collapses into one generic fetch error; the cause is logged here
/// and never reaches the HTTP response.
pub async fn fetch_attachment(
    http: &reqwest::Client,
    image_url: &str,
) -> Result<Attachment, GateError> {
    let url = reqwest::Url::parse(image_url).map_err(|e| {
        warn!("invalid image URL '{image_url}': {e}");
        fetch_failed()
    })?;

    let filename = filename_from_url(&url);

    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            warn!("image fetch failed for '{image_url}': {e}");
            fetch_failed()
        })?;

    let mime_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_MIME)
        .to_string();

    let data = response
        .bytes()
        .await
        .map_err(|e| {
            warn!("image body read failed for '{image_url}': {e}");
            fetch_failed()
        })?
        .to_vec();

    Ok(Attachment {
        mime_type,
        data,
        filename,
    })
}

fn fetch_failed() -> GateError {
    GateError::Fetch("failed to fetch image from URL".to_string())
}

/// Derive a filename from the URL's final path segment. The query string
/// never leaks in because it is not part of the path.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> reqwest::Url {
        reqwest::Url::parse(s).unwrap()
    }

    #[test]
    fn test_filename_from_final_path_segment() {
        assert_eq!(
            filename_from_url(&parse("https://cdn.example.com/media/cat.png")),
            "cat.png"
        );
    }

    #[test]
    fn test_filename_strips_query_string() {
        assert_eq!(
            filename_from_url(&parse("https://cdn.example.com/cat.png?width=300&v=2")),
            "cat.png"
        );
    }

    #[test]
    fn test_filename_default_when_path_empty() {
        assert_eq!(
            filename_from_url(&parse("https://cdn.example.com/")),
            "image.jpg"
        );
        assert_eq!(
            filename_from_url(&parse("https://cdn.example.com/media/")),
            "image.jpg"
        );
    }
}
