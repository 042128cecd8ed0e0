//! Header-line parsing for the content-length probe.

/// Extract a `Content-Length` value from raw response header lines.
pub(crate) fn content_length(lines: &[String]) -> Option<u64> {
    header_value(lines, "content-length").and_then(|v| v.parse::<u64>().ok())
}

/// Extract the total from a `Content-Range: bytes a-b/<total>` header.
/// `bytes */<total>` also resolves; only a missing or non-numeric total
/// (e.g. `bytes 0-0/*`) returns `None`.
pub(crate) fn content_range_total(lines: &[String]) -> Option<u64> {
    let value = header_value(lines, "content-range")?;
    let rest = value.strip_prefix("bytes")?.trim();
    let total = rest.rsplit('/').next()?.trim();
    total.parse::<u64>().ok()
}

fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    for line in lines {
        if let Some((n, v)) = line.split_once(':') {
            if n.trim().eq_ignore_ascii_case(name) {
                return Some(v.trim());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_length_parses() {
        let l = lines(&["HTTP/1.1 200 OK", "Content-Length: 12345"]);
        assert_eq!(content_length(&l), Some(12345));
    }

    #[test]
    fn content_length_case_insensitive() {
        let l = lines(&["content-length: 7"]);
        assert_eq!(content_length(&l), Some(7));
    }

    #[test]
    fn content_length_unparsable_is_none() {
        let l = lines(&["Content-Length: lots"]);
        assert_eq!(content_length(&l), None);
        assert_eq!(content_length(&lines(&["HTTP/1.1 200 OK"])), None);
    }

    #[test]
    fn content_range_total_parses() {
        let l = lines(&[
            "HTTP/1.1 206 Partial Content",
            "Content-Range: bytes 0-0/52040670",
        ]);
        assert_eq!(content_range_total(&l), Some(52040670));
    }

    #[test]
    fn content_range_total_comes_after_slash() {
        // "bytes */total" still carries the total after the slash.
        let l = lines(&["Content-Range: bytes */999"]);
        assert_eq!(content_range_total(&l), Some(999));
        let bad = lines(&["Content-Range: bytes 0-0/*"]);
        assert_eq!(content_range_total(&bad), None);
    }
}
