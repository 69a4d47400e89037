use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Piped calculation request. JSON is tried first, then YAML, so
/// `cat demos/request.yaml | mora calculate` works like `--input`.
/// `None` when stdin is a terminal or carries only whitespace.
pub fn read_request<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut piped = String::new();
    io::stdin().read_to_string(&mut piped)?;
    parse_request(&piped)
}

fn parse_request<T: DeserializeOwned>(text: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text.starts_with('{') {
        let request = serde_json::from_str(text)
            .map_err(|e| format!("stdin request is not valid JSON: {e}"))?;
        return Ok(Some(request));
    }
    let request =
        serde_yaml::from_str(text).map_err(|e| format!("stdin request is not valid YAML: {e}"))?;
    Ok(Some(request))
}
