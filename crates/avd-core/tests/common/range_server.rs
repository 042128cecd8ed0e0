//! Minimal HTTP/1.1 server with Range GET support for integration tests.
//!
//! Serves one static body per server. HEAD answers with Content-Length;
//! GET with `Range: bytes=a-b` answers 206 with that slice. An optional
//! per-write delay throttles the body so tests can stop a job mid-flight.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates CDNs that block HEAD).
    pub head_blocked: bool,
    /// Delay inserted between body write slices (slows the transfer down).
    pub write_delay: Option<Duration>,
    /// Ranged GETs starting at this offset are answered with 500, so one
    /// chunk of a transfer can be made to fail while its siblings run.
    pub fail_range_start: Option<u64>,
}

/// Starts a server in a background thread serving `body`. Returns the URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process
/// exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: RangeServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        if opts.head_blocked {
            let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        if let (Some(fail_at), Some((start, _))) = (opts.fail_range_start, range) {
            if start == fail_at {
                let _ = stream
                    .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
                return;
            }
        }
        let (status, content_range, slice) = match range {
            Some((start, end_incl)) => {
                let start = start.min(total) as usize;
                let end_excl = (end_incl.saturating_add(1)).min(total) as usize;
                let slice = body.get(start..end_excl).unwrap_or(&body[0..0]);
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_excl.saturating_sub(1), total),
                    slice,
                )
            }
            None => (
                "200 OK",
                format!("bytes 0-{}/{}", total.saturating_sub(1), total),
                body,
            ),
        };
        let header = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\nAccept-Ranges: bytes\r\n\r\n",
            status,
            slice.len(),
            content_range
        );
        if stream.write_all(header.as_bytes()).is_err() {
            return;
        }
        match opts.write_delay {
            None => {
                let _ = stream.write_all(slice);
            }
            Some(delay) => {
                for piece in slice.chunks(1024) {
                    if stream.write_all(piece).is_err() {
                        return;
                    }
                    let _ = stream.flush();
                    thread::sleep(delay);
                }
            }
        }
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
}

/// Returns (method, optional (start, end_inclusive) from `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = spec.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = match b.trim() {
                            "" => u64::MAX,
                            s => s.parse::<u64>().unwrap_or(0),
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
