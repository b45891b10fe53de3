//! Monoio-native HTTP/HTTPS client implementation
//!
//! - Single-threaded async with monoio
//! - Direct TLS integration with rustls
//! - HTTP/1.1 with `Connection: close`; the body ends at `Content-Length`,
//!   at the chunked terminator, or when the peer closes
//! - Every request is bounded by the client's timeout

use crate::errors::{ExchangeError, Result};
use crate::traits::HttpTransport;
use async_trait::async_trait;
use monoio::io::{AsyncReadRent, AsyncWriteRentExt};
use monoio::net::TcpStream;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

const READ_CHUNK: usize = 8192;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Monoio-native HTTPS client
pub struct MonoioHttpsClient {
    tls_config: Arc<ClientConfig>,
    timeout: Duration,
}

/// TLS stream wrapper for monoio
struct TlsStream {
    stream: TcpStream,
    tls_conn: ClientConnection,
}

impl MonoioHttpsClient {
    /// Create a new HTTPS client trusting the webpki root set
    pub fn new(timeout: Duration) -> Self {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            tls_config: Arc::new(tls_config),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let parsed_url = url::Url::parse(&request.url)?;

        let host = parsed_url
            .host_str()
            .ok_or_else(|| ExchangeError::InvalidUrl("no host in URL".to_string()))?
            .to_string();
        let port = parsed_url.port().unwrap_or(443);

        let mut path_and_query = parsed_url.path().to_string();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        if let Some(query) = parsed_url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        let tcp_stream = TcpStream::connect(format!("{host}:{port}"))
            .await
            .map_err(|e| ExchangeError::Network(format!("TCP connect failed: {e}")))?;

        let server_name = ServerName::try_from(host.clone())
            .map_err(|e| ExchangeError::Network(format!("invalid server name: {e:?}")))?;
        let tls_conn = ClientConnection::new(self.tls_config.clone(), server_name)
            .map_err(|e| ExchangeError::Network(format!("TLS setup failed: {e}")))?;

        let mut tls_stream = TlsStream {
            stream: tcp_stream,
            tls_conn,
        };

        let raw_request = build_request(request, &host, &path_and_query);
        trace!("➡️ {} {}", request.method, path_and_query);

        tls_stream.complete_handshake().await?;
        tls_stream.write_all(raw_request.as_bytes()).await?;
        let response_data = tls_stream.read_response().await?;

        parse_http_response(&response_data)
    }
}

impl Default for MonoioHttpsClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait(?Send)]
impl HttpTransport for MonoioHttpsClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        match monoio::time::timeout(self.timeout, self.send(&request)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("⏱️ {} {} timed out after {:?}", request.method, request.url, self.timeout);
                Err(ExchangeError::Network(format!(
                    "request timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

/// Parameters travel in the query string, so requests carry no body.
fn build_request(request: &HttpRequest, host: &str, path_and_query: &str) -> String {
    let mut raw = format!(
        "{} {path_and_query} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: perpdesk/0.1\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n\
         Content-Length: 0\r\n",
        request.method
    );

    for (key, value) in &request.headers {
        raw.push_str(&format!("{key}: {value}\r\n"));
    }

    raw.push_str("\r\n");
    raw
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Whether `data` already holds the full response, judged from its headers.
fn response_complete(data: &[u8]) -> bool {
    let Some(header_end) = find_header_end(data) else {
        return false;
    };
    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let body = &data[header_end + 4..];

    for line in head.lines().skip(1) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "content-length" => {
                if let Ok(len) = value.trim().parse::<usize>() {
                    return body.len() >= len;
                }
            }
            "transfer-encoding" if value.contains("chunked") => {
                return body.ends_with(b"0\r\n\r\n");
            }
            _ => {}
        }
    }
    false
}

/// Decode a `Transfer-Encoding: chunked` body.
fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(body.len());
    loop {
        let line_end = body
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| ExchangeError::Network("truncated chunked body".to_string()))?;
        let size_line = String::from_utf8_lossy(&body[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| ExchangeError::Network(format!("invalid chunk size {size_hex:?}")))?;

        body = &body[line_end + 2..];
        if size == 0 {
            return Ok(decoded);
        }
        if body.len() < size {
            return Err(ExchangeError::Network("truncated chunked body".to_string()));
        }
        decoded.extend_from_slice(&body[..size]);
        body = body.get(size + 2..).unwrap_or(&[]);
    }
}

/// Parse a raw HTTP/1.1 response
fn parse_http_response(data: &[u8]) -> Result<HttpResponse> {
    let header_end = find_header_end(data).ok_or_else(|| {
        ExchangeError::Network("invalid HTTP response: no header terminator".to_string())
    })?;

    let head = String::from_utf8_lossy(&data[..header_end]);
    let mut lines = head.lines();

    let status_line = lines
        .next()
        .ok_or_else(|| ExchangeError::Network("empty response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| ExchangeError::Network(format!("invalid status line {status_line:?}")))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked")
    });

    let raw_body = &data[header_end + 4..];
    let body = if chunked {
        decode_chunked(raw_body)?
    } else {
        let len = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(raw_body.len());
        raw_body[..len.min(raw_body.len())].to_vec()
    };

    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

impl TlsStream {
    /// Flush whatever TLS records rustls has queued
    async fn flush_tls(&mut self) -> Result<()> {
        while self.tls_conn.wants_write() {
            let mut out = Vec::with_capacity(READ_CHUNK);
            self.tls_conn
                .write_tls(&mut out)
                .map_err(|e| ExchangeError::Network(format!("TLS write failed: {e}")))?;
            if out.is_empty() {
                break;
            }
            let (result, _) = self.stream.write_all(out).await;
            result.map_err(|e| ExchangeError::Network(format!("TCP write failed: {e}")))?;
        }
        Ok(())
    }

    /// Read one batch of TLS records from the socket. Returns false on EOF.
    async fn fill_tls(&mut self) -> Result<bool> {
        let (result, buf) = self.stream.read(vec![0u8; READ_CHUNK]).await;
        let bytes_read =
            result.map_err(|e| ExchangeError::Network(format!("TCP read failed: {e}")))?;
        if bytes_read == 0 {
            return Ok(false);
        }

        self.tls_conn
            .read_tls(&mut std::io::Cursor::new(&buf[..bytes_read]))
            .map_err(|e| ExchangeError::Network(format!("TLS read failed: {e}")))?;
        self.tls_conn
            .process_new_packets()
            .map_err(|e| ExchangeError::Network(format!("TLS process failed: {e}")))?;
        Ok(true)
    }

    async fn complete_handshake(&mut self) -> Result<()> {
        while self.tls_conn.is_handshaking() {
            self.flush_tls().await?;
            if !self.tls_conn.is_handshaking() {
                break;
            }
            if !self.tls_conn.wants_read() {
                return Err(ExchangeError::Network("TLS handshake stalled".to_string()));
            }
            if !self.fill_tls().await? {
                return Err(ExchangeError::Network(
                    "connection closed during handshake".to_string(),
                ));
            }
        }
        self.flush_tls().await
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.tls_conn
            .writer()
            .write_all(data)
            .map_err(|e| ExchangeError::Network(format!("TLS application write failed: {e}")))?;
        self.flush_tls().await
    }

    async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        let mut plain = vec![0u8; READ_CHUNK];

        loop {
            loop {
                match self.tls_conn.reader().read(&mut plain) {
                    Ok(0) => break,
                    Ok(n) => response.extend_from_slice(&plain[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        return Ok(response);
                    }
                    Err(e) => return Err(ExchangeError::Network(format!("TLS read failed: {e}"))),
                }
            }

            if response_complete(&response) {
                return Ok(response);
            }
            if !self.fill_tls().await? {
                return Ok(response);
            }
        }
    }
}
