//! Content-length resolution for a stream URL.
//!
//! Tries a HEAD request first and reads `Content-Length`; some media CDNs
//! block HEAD, so on failure a one-byte ranged GET is issued and the total is
//! taken from the `Content-Range` header. An unresolvable or unparsable
//! length is fatal for the media download that needs it.

mod parse;

use std::collections::HashMap;
use std::str;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Curl(#[from] curl::Error),
    #[error("probe returned HTTP {0}")]
    Http(u32),
    #[error("no usable Content-Length or Content-Range in response")]
    LengthUnavailable,
}

/// Resolves the total byte length of the resource at `url`.
///
/// Blocking; call from a worker thread or `spawn_blocking` in async code.
pub fn resolve_content_length(
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<u64, ProbeError> {
    match head_content_length(url, headers) {
        Ok(Some(len)) => return Ok(len),
        Ok(None) => {
            tracing::debug!(url, "HEAD gave no Content-Length, trying ranged GET");
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "HEAD probe failed, trying ranged GET");
        }
    }
    ranged_content_length(url, headers)
}

fn head_content_length(
    url: &str,
    custom_headers: &HashMap<String, String>,
) -> Result<Option<u64>, ProbeError> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.nobody(true)?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;
    apply_headers(&mut easy, custom_headers)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(ProbeError::Http(code));
    }
    Ok(parse::content_length(&lines))
}

/// `GET` with `Range: bytes=0-0`; the total comes from `Content-Range`
/// (`bytes 0-0/<total>`). The one-byte body is discarded.
fn ranged_content_length(
    url: &str,
    custom_headers: &HashMap<String, String>,
) -> Result<u64, ProbeError> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;
    easy.range("0-0")?;
    apply_headers(&mut easy, custom_headers)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| Ok(data.len()))?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(ProbeError::Http(code));
    }

    // A 206 carries the total in Content-Range; a server that ignored the
    // Range request answers 200 with a plain Content-Length.
    parse::content_range_total(&lines)
        .or_else(|| {
            if code == 200 {
                parse::content_length(&lines)
            } else {
                None
            }
        })
        .ok_or(ProbeError::LengthUnavailable)
}

fn apply_headers(
    easy: &mut curl::easy::Easy,
    custom_headers: &HashMap<String, String>,
) -> Result<(), curl::Error> {
    if custom_headers.is_empty() {
        return Ok(());
    }
    let mut list = curl::easy::List::new();
    for (k, v) in custom_headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)
}
