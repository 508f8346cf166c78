use std::io::{BufRead, Read};

use log::trace;
use url::Url;

use self::headers::Headers;
use crate::error::{ResultExt, RouterError, RouterResult};

pub mod blocking_http_server;
pub mod context;
pub mod dispatcher;
pub mod headers;
pub mod http_status;
pub mod response;
pub mod response_builder;

/// Upper bound for a request body read off the wire
pub const MAX_BODY_LEN: usize = 1024 * 1024;

/// Upper bound for the request line plus headers
pub const MAX_HEAD_LEN: usize = 8 * 1024;

/// An incoming request.
///
/// The method is kept as sent; the dispatcher answers unknown verbs with 501.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Headers,
    pub body: String,
}

impl Request {
    pub fn create(method: &str, url: Url, headers: Headers, body: String) -> Request {
        Request {
            method: method.to_string(),
            url,
            headers,
            body,
        }
    }

    /// Path component of the URL, still percent-encoded
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Parses a request line plus header lines.
    ///
    /// The URL's host comes from the `Host` header, or `fallback_host` when the
    /// request has none.
    pub fn parse(head: &str, fallback_host: &str) -> RouterResult<Request> {
        let mut lines = head.lines();
        let request_line = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or_else(|| RouterError::bad_request("Empty request"))?;

        let mut parts = request_line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(target), Some(version), None) => (method, target, version),
            _ => return Err(RouterError::bad_request(format!("Malformed request line: {}", request_line))),
        };
        if !version.starts_with("HTTP/1.") {
            return Err(RouterError::HttpParse {
                context: format!("Unsupported protocol: {}", version),
                status_code: 505,
            });
        }

        let headers = Headers::from_lines(lines);
        let url = if target.starts_with('/') {
            origin_url(headers.get("host").unwrap_or(fallback_host), target)?
        } else {
            Url::parse(target)
                .map_err(|e| RouterError::bad_request(format!("Invalid request target '{}': {}", target, e)))?
        };

        trace!("Parsed {} {}", method, url);
        Ok(Request::create(method, url, headers, String::new()))
    }

    /// Reads the head up to the blank line, then a `Content-Length` body.
    pub fn read_from<R: BufRead>(reader: &mut R, fallback_host: &str) -> RouterResult<Request> {
        let mut head = String::new();
        loop {
            let remaining = MAX_HEAD_LEN - head.len();
            let mut line = String::new();
            let read = reader
                .by_ref()
                .take(remaining as u64)
                .read_line(&mut line)
                .context("Failed to read request head")?;
            if read == remaining && !line.ends_with('\n') {
                return Err(RouterError::HttpParse {
                    context: format!("Request head exceeds {} bytes", MAX_HEAD_LEN),
                    status_code: 431,
                });
            }
            if read == 0 {
                break;
            }
            if line.trim_end().is_empty() {
                break;
            }
            head.push_str(&line);
        }

        let mut request = Request::parse(&head, fallback_host)?;
        if let Some(len) = request.headers.content_length()? {
            if len > MAX_BODY_LEN {
                return Err(RouterError::HttpParse {
                    context: format!("Body of {} bytes exceeds {} bytes", len, MAX_BODY_LEN),
                    status_code: 413,
                });
            }
            let mut body = vec![0u8; len];
            reader.read_exact(&mut body).context("Failed to read request body")?;
            request.body = String::from_utf8(body)
                .map_err(|_| RouterError::bad_request("Invalid UTF-8 in request body"))?;
        }
        Ok(request)
    }
}

/// Absolute URL for an origin-form target.
///
/// The host only ever becomes the authority: anything beyond `host[:port]`
/// is refused so the header cannot alter the routed path.
fn origin_url(host: &str, target: &str) -> RouterResult<Url> {
    let invalid_host = || RouterError::bad_request(format!("Invalid Host header: {:?}", host));
    if host.is_empty()
        || host
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '@'))
    {
        return Err(invalid_host());
    }
    let mut url = Url::parse(&format!("http://{}/", host)).map_err(|_| invalid_host())?;
    if url.path() != "/" || !url.username().is_empty() {
        return Err(invalid_host());
    }

    let target = target.split_once('#').map_or(target, |(before, _)| before);
    match target.split_once('?') {
        Some((path, query)) => {
            url.set_path(path);
            url.set_query(Some(query));
        }
        None => url.set_path(target),
    }
    Ok(url)
}
