use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialise a piped JSON document from stdin.
/// Returns None when stdin is a TTY or nothing was piped.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    tracing::debug!(bytes = trimmed.len(), "read input from stdin");

    let value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse stdin: {}", e))?;
    Ok(Some(value))
}

/// File input when given, piped stdin otherwise.
pub fn load_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return super::file::read_json(path);
    }
    read_stdin()?.ok_or_else(|| format!("--input <file.json> or stdin required for {what}").into())
}
