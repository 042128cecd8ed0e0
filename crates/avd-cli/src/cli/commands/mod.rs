mod get;
mod probe;

pub use get::run_get;
pub use probe::run_probe;

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Parses repeated `--header "Name: value"` flags into a header map.
pub(crate) fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("invalid header {:?}, expected \"Name: value\"", entry);
        };
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_headers_splits_on_first_colon() {
        let parsed = parse_headers(&[
            "Referer: https://media.example.com/".to_string(),
            "Cookie: SESSION=abc:def".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed["Referer"], "https://media.example.com/");
        assert_eq!(parsed["Cookie"], "SESSION=abc:def");
    }

    #[test]
    fn parse_headers_rejects_missing_colon() {
        assert!(parse_headers(&["not-a-header".to_string()]).is_err());
    }
}
