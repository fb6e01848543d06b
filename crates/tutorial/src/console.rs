//! A line based front end: each input line is one request, each answer is printed back.
//!
//! A line reads `METHOD PATH [JSON]`, for example `POST /users {"username": "alice"}`. Blank
//! lines and lines starting with `#` are skipped.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("expected `METHOD PATH [JSON]`")]
    MissingPath,

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Parses one line; `Ok(None)` for lines that carry no request.
pub fn parse_line(line: &str) -> Result<Option<Request<Bytes>>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (method, rest) = line.split_once(char::is_whitespace).ok_or(ConsoleError::MissingPath)?;
    let rest = rest.trim_start();
    let (uri, body) = match rest.split_once(char::is_whitespace) {
        Some((uri, body)) => (uri, body.trim()),
        None => (rest, ""),
    };
    if uri.is_empty() {
        return Err(ConsoleError::MissingPath);
    }

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConsoleError::InvalidMethod(method.to_owned()))?;
    let mut request = Request::builder().method(method).uri(uri);
    if !body.is_empty() {
        request = request.header(CONTENT_TYPE, "application/json");
    }
    request
        .body(Bytes::copy_from_slice(body.as_bytes()))
        .map(Some)
        .map_err(|e| ConsoleError::InvalidRequest(e.to_string()))
}

/// Renders the status line followed by the body, if any.
pub fn render(response: &Response<Bytes>) -> String {
    let status = response.status();
    let mut out = format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or_default());
    if !response.body().is_empty() {
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(response.body()));
    }
    out
}
