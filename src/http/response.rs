use std::io;

use crate::http::body::Body;
use crate::http::writer::{ResponseWriter, serialize_head};

/// HTTP status codes supported by the server.
///
/// - `Ok` (200): file or directory served
/// - `BadRequest` (400): unparsable request line
/// - `Forbidden` (403): traversal outside the root under the `reject` policy
/// - `NotFound` (404): target does not exist
/// - `MethodNotAllowed` (405): anything but GET or HEAD
/// - `RequestHeaderFieldsTooLarge` (431): header block over the size cap
/// - `InternalServerError` (500): unexpected I/O failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use dirserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// `"<code> <reason>"`, as it appears after the version on the status line.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Response headers in insertion order.
///
/// Names compare case-insensitively; setting an existing name replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A response ready to be handed to a connection.
///
/// The body is a restartable source, not bytes: nothing beyond the
/// headers is materialized until the connection writes it.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they will be written
    pub headers: Headers,
    /// `None` for HEAD responses
    pub body: Option<Body>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html; charset=UTF-8")
///     .body(Body::from(listing))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Option<Body>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the final Response.
    ///
    /// `Content-Length` is computed from a counting pass over the body
    /// unless already present.
    pub fn build(mut self) -> Response {
        if !self.headers.contains("Content-Length") {
            let len = self.body.as_ref().map_or(0, Body::content_length);
            self.headers.insert("Content-Length", len.to_string());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Drops the body but keeps every header, `Content-Length` included.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Declared `Content-Length`, if parsable.
    pub fn content_length(&self) -> Option<u64> {
        self.headers.get("Content-Length")?.parse().ok()
    }

    /// Serialized status line and headers, blank line included.
    pub fn head(&self) -> bytes::Bytes {
        serialize_head(self.status, &self.headers)
    }

    /// Opens the body for transmission and pairs it with the header block.
    pub fn into_writer(self) -> io::Result<ResponseWriter> {
        let chunks = self.body.as_ref().map(Body::chunks).transpose()?;
        Ok(ResponseWriter::new(self.head(), chunks))
    }
}
