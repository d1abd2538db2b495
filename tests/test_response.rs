use bytes::Bytes;
use dirserve::http::body::Body;
use dirserve::http::response::{Headers, ResponseBuilder, StatusCode};
use dirserve::http::writer::serialize_head;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::RequestHeaderFieldsTooLarge.as_u16(), 431);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_line() {
    assert_eq!(StatusCode::Ok.status_line(), "200 OK");
    assert_eq!(StatusCode::NotFound.status_line(), "404 Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.status_line(),
        "405 Method Not Allowed"
    );
}

#[test]
fn test_headers_keep_insertion_order() {
    let mut headers = Headers::new();
    headers.insert("Content-Length", "3");
    headers.insert("Date", "now");
    headers.insert("Server", "test");

    let names: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
    assert_eq!(names, ["Content-Length", "Date", "Server"]);
}

#[test]
fn test_headers_replace_case_insensitively() {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "text/plain");
    headers.insert("content-type", "text/html");

    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
}

#[test]
fn test_response_builder_auto_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(Bytes::from_static(b"This is the body"))
        .build();

    assert_eq!(response.headers.get("Content-Length"), Some("16"));
    assert_eq!(response.content_length(), Some(16));
}

#[test]
fn test_response_builder_preserves_explicit_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(Bytes::from_static(b"test"))
        .build();

    assert_eq!(response.headers.get("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert!(response.body.is_none());
    assert_eq!(response.headers.get("Content-Length"), Some("0"));
}

#[test]
fn test_without_body_keeps_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(Bytes::from_static(b"abc"))
        .build()
        .without_body();

    assert!(response.body.is_none());
    assert_eq!(response.content_length(), Some(3));
}

#[test]
fn test_serialize_head() {
    let mut headers = Headers::new();
    headers.insert("Content-Length", "5");
    headers.insert("Server", "test");

    let head = serialize_head(StatusCode::NotFound, &headers);

    assert_eq!(
        &head[..],
        b"HTTP/1.0 404 Not Found\r\nContent-Length: 5\r\nServer: test\r\n\r\n"
    );
}

#[test]
fn test_into_writer_sends_head_then_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body(Body::from(Bytes::from_static(b"hello")))
        .build();

    let mut writer = response.into_writer().unwrap();
    let mut out = Vec::new();
    writer.write_to(&mut out).unwrap();

    assert_eq!(
        out,
        b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello"
    );
}
