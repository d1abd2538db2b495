#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use dirserve::config::{Config, TraversalPolicy};
use dirserve::http::handler::RequestHandler;
use dirserve::http::resolver::PathResolver;
use dirserve::server::{Server, ServerError, ShutdownHandle};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Temporary directory removed on drop.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new(prefix: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "dirserve-{}-{}-{}",
            prefix,
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path.join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Root layout used by most tests:
///
/// ```text
/// <root>/
///   site/
///     index.html
///     notes.txt
///     <b>.txt
///     a b.txt
///     nested/
///       deep.txt
/// outside.txt        (sibling of the root, must never be served)
/// ```
pub struct Fixture {
    pub dir: TestDir,
}

impl Fixture {
    pub fn new(prefix: &str) -> Self {
        let dir = TestDir::new(prefix);
        dir.write("outside.txt", "secret");
        dir.write("site/index.html", "<p>hello</p>");
        dir.write("site/notes.txt", "some notes\n");
        dir.write("site/<b>.txt", "bold");
        dir.write("site/a b.txt", "spaced");
        dir.write("site/nested/deep.txt", "deep");
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("site")
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config::default();
        cfg.server.bind_address = "127.0.0.1".to_string();
        cfg.server.port = 0;
        cfg.static_files.root = self.root();
        cfg
    }

    pub fn handler(&self, policy: TraversalPolicy) -> RequestHandler {
        let resolver = PathResolver::new(self.root(), policy).unwrap();
        RequestHandler::new(resolver, "Directory Listing Server", 1024)
    }
}

/// A server running on a background thread.
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<Result<(), ServerError>>>,
}

impl RunningServer {
    pub fn start(cfg: &Config) -> Self {
        let server = Server::bind(cfg).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let thread = std::thread::spawn(move || server.run());
        Self {
            addr,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn stop(mut self) {
        self.shutdown.trigger();
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap().unwrap();
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shutdown.trigger();
            let _ = thread.join();
        }
    }
}

/// Sends `request` and reads until the server closes the connection.
pub fn roundtrip(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(request).unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    out
}

/// Splits a raw response into status line, headers and body.
pub fn split_response(raw: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header terminator");
    let head = std::str::from_utf8(&raw[..end]).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().to_string();
    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();
    (status, headers, raw[end + 4..].to_vec())
}

pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
