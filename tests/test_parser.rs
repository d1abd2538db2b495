use dirserve::http::parser::{ParseError, find_headers_end, parse_http_request};
use dirserve::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target, "");
    assert_eq!(parsed.version, "HTTP/1.0");
}

#[test]
fn test_parse_strips_leading_slash() {
    let req = b"HEAD /docs/readme.txt HTTP/1.1\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::HEAD);
    assert_eq!(parsed.target, "docs/readme.txt");
}

#[test]
fn test_parse_percent_decodes_target() {
    let req = b"GET /a%20b/%3Cb%3E.txt HTTP/1.0\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "a b/<b>.txt");
}

#[test]
fn test_parse_decodes_utf8_target() {
    let req = b"GET /caf%C3%A9 HTTP/1.0\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "café");
}

#[test]
fn test_parse_drops_query_string() {
    let req = b"GET /search.html?q=rust HTTP/1.0\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "search.html");
}

#[test]
fn test_parse_keeps_traversal_segments_for_resolver() {
    let req = b"GET /../../etc/passwd HTTP/1.0\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "../../etc/passwd");
}

#[test]
fn test_parse_missing_version_defaults() {
    let req = b"GET /x\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.version, "HTTP/1.0");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.0\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_request_line_without_target() {
    let req = b"GET\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));
}

#[test]
fn test_parse_empty_request_line() {
    let result = parse_http_request(b"\r\n\r\n");

    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));
}

#[test]
fn test_parse_invalid_utf8_after_decoding() {
    let req = b"GET /%FF%FE HTTP/1.0\r\n\r\n";
    let result = parse_http_request(req);

    assert_eq!(result, Err(ParseError::InvalidEncoding));
}

#[test]
fn test_parse_unknown_method_is_kept() {
    let req = b"BREW /pot HTTP/1.0\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::Other("BREW".to_string()));
    assert!(!parsed.method.is_allowed());
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::OPTIONS),
        ("PATCH", Method::PATCH),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} / HTTP/1.0\r\n\r\n", method_str);
        let parsed = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected_method);
        assert_eq!(parsed.method.as_str(), method_str);
    }
}

#[test]
fn test_find_headers_end() {
    assert_eq!(find_headers_end(b"GET / HTTP/1.0\r\n\r\nrest"), Some(14));
    assert_eq!(find_headers_end(b"GET / HTTP/1.0\r\n"), None);
}
