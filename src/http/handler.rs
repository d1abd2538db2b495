//! Turns a raw header block into a response.

use std::fs;
use std::io;
use std::time::SystemTime;

use bytes::Bytes;
use html_escape::encode_text;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::body::{Body, DirectoryListing, FileBody};
use crate::http::error::HttpError;
use crate::http::mime;
use crate::http::parser::parse_http_request;
use crate::http::request::Request;
use crate::http::resolver::{PathResolver, ResolvedTarget};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

pub struct RequestHandler {
    resolver: PathResolver,
    server_name: String,
    chunk_size: usize,
}

impl RequestHandler {
    pub fn new(resolver: PathResolver, server_name: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            resolver,
            server_name: server_name.into(),
            chunk_size,
        }
    }

    pub fn from_config(cfg: &Config) -> io::Result<Self> {
        let resolver = PathResolver::new(&cfg.static_files.root, cfg.static_files.traversal)?;
        Ok(Self::new(
            resolver,
            cfg.server.server_name.clone(),
            cfg.static_files.chunk_size,
        ))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Builds the response for one buffered request.
    ///
    /// Never fails: parse, lookup and method errors all come back as error
    /// pages. Method policy is applied last, so HEAD keeps the headers of
    /// the equivalent GET and any other method is a 405 whatever the path.
    pub fn handle(&self, raw: &[u8]) -> Response {
        let request = match parse_http_request(raw) {
            Ok(request) => request,
            Err(err) => {
                let response = self.error_response(&HttpError::from(err));
                info!(status = response.status.as_u16(), "Rejected malformed request");
                return response;
            }
        };

        let response = match self.serve(&request) {
            Ok(response) => response,
            Err(err) => self.error_response(&err),
        };

        let response = if request.is_head() {
            response.without_body()
        } else if !request.method.is_allowed() {
            self.error_response(&HttpError::MethodNotAllowed(request.method.to_string()))
        } else {
            response
        };

        info!(
            method = %request.method,
            path = %request.target,
            status = response.status.as_u16(),
            bytes = response.content_length().unwrap_or(0),
            "Request served"
        );
        response
    }

    /// [`handle`](Self::handle), then opens the body for writing.
    ///
    /// A body that cannot be opened (the file vanished after it was
    /// stat'ed) degrades to a 500 page.
    pub fn respond(&self, raw: &[u8]) -> io::Result<ResponseWriter> {
        self.handle(raw).into_writer().or_else(|err| {
            warn!(error = %err, "Failed to open response body");
            self.error_response(&HttpError::Io(err)).into_writer()
        })
    }

    /// HTML error page: escaped message plus a link back to the root.
    pub fn error_response(&self, err: &HttpError) -> Response {
        let body = format!(
            "<html>\n<body>\n<h1>{}</h1>\n<a href=\"/\">Back to root directory</a>\n</body>\n</html>\n",
            encode_text(&err.to_string())
        );

        ResponseBuilder::new(err.status())
            .header("Content-Length", body.len().to_string())
            .header("Content-Type", HTML_CONTENT_TYPE)
            .header("Date", http_date(SystemTime::now()))
            .header("Server", self.server_name.as_str())
            .body(Bytes::from(body))
            .build()
    }

    fn serve(&self, request: &Request) -> Result<Response, HttpError> {
        let target = self.resolver.resolve(&request.target)?;

        if target.is_directory {
            self.directory_response(&target, request)
        } else {
            self.file_response(&target, request)
        }
    }

    fn directory_response(
        &self,
        target: &ResolvedTarget,
        request: &Request,
    ) -> Result<Response, HttpError> {
        let body = Body::from(
            DirectoryListing::read(&target.path).map_err(|e| not_found_or_io(e, request))?,
        );

        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", body.content_length().to_string())
            .header("Content-Type", HTML_CONTENT_TYPE)
            .header("Date", http_date(SystemTime::now()))
            .header("Server", self.server_name.as_str())
            .body(body)
            .build())
    }

    fn file_response(
        &self,
        target: &ResolvedTarget,
        request: &Request,
    ) -> Result<Response, HttpError> {
        let metadata = fs::metadata(&target.path).map_err(|e| not_found_or_io(e, request))?;
        // FIFOs and device nodes would block the event loop on open or read.
        if !metadata.is_file() {
            return Err(HttpError::NotFound(request.target.clone()));
        }
        let len = metadata.len();

        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", len.to_string())
            .header("Date", http_date(SystemTime::now()));
        if let Ok(modified) = metadata.modified() {
            builder = builder.header("Last-Modified", http_date(modified));
        }
        builder = builder.header("Server", self.server_name.as_str());

        if let Some(info) = mime::lookup(&target.path) {
            if let Some(content_type) = info.content_type {
                builder = builder.header("Content-Type", content_type);
            }
            if let Some(encoding) = info.encoding {
                builder = builder.header("Content-Encoding", encoding);
            }
        }

        Ok(builder
            .body(FileBody::new(&target.path, len, self.chunk_size))
            .build())
    }
}

fn not_found_or_io(err: io::Error, request: &Request) -> HttpError {
    if err.kind() == io::ErrorKind::NotFound {
        HttpError::NotFound(request.target.clone())
    } else {
        HttpError::Io(err)
    }
}

/// RFC 1123 / IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}
