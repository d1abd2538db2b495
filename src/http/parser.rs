use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::http::request::{Method, Request};

/// Header block terminator.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// No `\r\n\r\n` yet; keep reading.
    #[error("request header block is incomplete")]
    Incomplete,
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("request target is not valid UTF-8 after percent-decoding")]
    InvalidEncoding,
}

/// Parses the request line out of a buffered header block.
///
/// Only the first line is interpreted: token 0 is the method, token 1 the
/// target. The version token is optional. The target loses its leading `/`
/// and any query string, then gets percent-decoded.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];

    let first_line = header_bytes
        .split(|&b| b == b'\n')
        .next()
        .unwrap_or_default();
    let first_line = first_line.strip_suffix(b"\r").unwrap_or(first_line);
    let request_line = std::str::from_utf8(first_line)
        .map_err(|_| ParseError::MalformedRequestLine(String::from_utf8_lossy(first_line).into_owned()))?;

    let mut parts = request_line.split_whitespace();
    let malformed = || ParseError::MalformedRequestLine(request_line.to_string());

    let method = parts.next().ok_or_else(malformed)?;
    let raw_target = parts.next().ok_or_else(malformed)?;
    let version = parts.next().unwrap_or("HTTP/1.0");

    Ok(Request {
        method: Method::from_token(method),
        target: decode_target(raw_target)?,
        version: version.to_string(),
    })
}

/// Position of the first `\r\n\r\n`, if any.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

fn decode_target(raw: &str) -> Result<String, ParseError> {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let path = path.strip_prefix('/').unwrap_or(path);

    percent_decode_str(path)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::InvalidEncoding)
}
