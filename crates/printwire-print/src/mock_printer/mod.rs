// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A scripted IPP printer on a loopback ephemeral port, for tests.
//
// Each accepted connection is handled on its own task: the HTTP envelope is
// read (Content-Length or chunked), the IPP request is parsed and recorded,
// and the configured behaviour decides the reply.

pub mod wire;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use printwire_core::config::DispatchConfig;

pub use wire::{IppMessage, TAG_JOB_ATTRIBUTES, TAG_OPERATION_ATTRIBUTES, WireAttribute};

use wire::{IppMessageWriter, decode_chunked, find_subsequence, parse_ipp_message};

/// Maximum request size the mock will buffer.
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// IPP job-state `pending` (RFC 8011 SS5.3.7).
const JOB_STATE_PENDING: i32 = 3;

/// How the mock printer answers a Print-Job.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// `successful-ok` with the given job-id.
    Accept { job_id: i32 },
    /// As `Accept`, but with a chunked HTTP body.
    AcceptChunked { job_id: i32 },
    /// An IPP error status with a `status-message`.
    Reject { status: u16, message: String },
    /// A bare HTTP error with no IPP body.
    HttpStatus(u16),
    /// `successful-ok` without a job-id.
    OmitJobId,
    /// HTTP 200 with a body that is not IPP.
    Garbage,
    /// Read the request, then never answer.
    Hang,
}

/// A request the mock printer received.
#[derive(Debug, Clone)]
pub struct ReceivedJob {
    pub http_path: String,
    pub message: IppMessage,
}

pub struct MockPrinter {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedJob>>>,
    handle: JoinHandle<()>,
}

impl MockPrinter {
    /// Bind `127.0.0.1:0` and start accepting.
    pub async fn start(behaviour: MockBehaviour) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "mock printer accept failed");
                        continue;
                    }
                };
                debug!(%peer, "mock printer connection");
                let behaviour = behaviour.clone();
                let received = Arc::clone(&shared);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, behaviour, received).await {
                        warn!(%peer, error = %e, "mock printer connection error");
                    }
                });
            }
        });

        info!(%addr, "mock printer listening");
        Ok(Self {
            addr,
            received,
            handle,
        })
    }

    pub fn address(&self) -> &'static str {
        "127.0.0.1"
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Default config pointed at this printer.
    pub fn config(&self) -> DispatchConfig {
        DispatchConfig {
            ipp_port: self.port(),
            ..DispatchConfig::default()
        }
    }

    /// Requests received so far, in arrival order.
    pub fn jobs(&self) -> Vec<ReceivedJob> {
        self.received
            .lock()
            .map(|jobs| jobs.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockPrinter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    behaviour: MockBehaviour,
    received: Arc<Mutex<Vec<ReceivedJob>>>,
) -> std::io::Result<()> {
    let Some((http_path, body)) = read_request(&mut stream).await? else {
        return Ok(());
    };

    let message = match parse_ipp_message(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "mock printer got malformed IPP");
            return send_http(&mut stream, 400, "Bad Request", &[]).await;
        }
    };
    let request_id = message.request_id;
    if let Ok(mut jobs) = received.lock() {
        jobs.push(ReceivedJob { http_path, message });
    }

    match behaviour {
        MockBehaviour::Accept { job_id } => {
            send_http(&mut stream, 200, "OK", &ipp_reply(0x0000, request_id, Some(job_id), None)).await
        }
        MockBehaviour::AcceptChunked { job_id } => {
            let body = ipp_reply(0x0000, request_id, Some(job_id), None);
            send_chunked(&mut stream, &body).await
        }
        MockBehaviour::Reject { status, message } => {
            send_http(&mut stream, 200, "OK", &ipp_reply(status, request_id, None, Some(&message))).await
        }
        MockBehaviour::HttpStatus(status) => send_http(&mut stream, status, "Error", &[]).await,
        MockBehaviour::OmitJobId => {
            send_http(&mut stream, 200, "OK", &ipp_reply(0x0000, request_id, None, None)).await
        }
        MockBehaviour::Garbage => send_http(&mut stream, 200, "OK", b"not ipp").await,
        MockBehaviour::Hang => {
            std::future::pending::<()>().await;
            Ok(())
        }
    }
}

/// Read one HTTP POST; returns the request path and body.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<(String, Vec<u8>)>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..read]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Ok(None);
        }

        let Some(header_end) = find_subsequence(&buf, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let path = head
            .lines()
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .unwrap_or("/")
            .to_string();
        let header = |name: &str| {
            head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_string())
            })
        };

        let body = &buf[header_end + 4..];
        let chunked = header("transfer-encoding")
            .is_some_and(|value| value.to_ascii_lowercase().contains("chunked"));
        if chunked {
            match decode_chunked(body) {
                Ok(Some(decoded)) => return Ok(Some((path, decoded))),
                Ok(None) => continue,
                Err(e) => {
                    return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e));
                }
            }
        }

        let content_length = header("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        if body.len() >= content_length {
            return Ok(Some((path, body[..content_length].to_vec())));
        }
    }
}

fn ipp_reply(status: u16, request_id: u32, job_id: Option<i32>, message: Option<&str>) -> Vec<u8> {
    let mut writer = IppMessageWriter::new(status, request_id);
    writer
        .begin_group(TAG_OPERATION_ATTRIBUTES)
        .attribute(&WireAttribute::charset("attributes-charset", "utf-8"))
        .attribute(&WireAttribute::natural_language(
            "attributes-natural-language",
            "en",
        ));
    if let Some(message) = message {
        writer.attribute(&WireAttribute::text("status-message", message));
    }
    if let Some(job_id) = job_id {
        writer
            .begin_group(TAG_JOB_ATTRIBUTES)
            .attribute(&WireAttribute::integer("job-id", job_id))
            .attribute(&WireAttribute::enumeration("job-state", JOB_STATE_PENDING));
    }
    writer.finish()
}

async fn send_http(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    body: &[u8],
) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/ipp\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await
}

async fn send_chunked(stream: &mut TcpStream, body: &[u8]) -> std::io::Result<()> {
    stream
        .write_all(
            b"HTTP/1.1 100 Continue\r\n\r\n\
              HTTP/1.1 200 OK\r\n\
              Content-Type: application/ipp\r\n\
              Transfer-Encoding: chunked\r\n\
              \r\n",
        )
        .await?;
    let (first, second) = body.split_at(body.len() / 2);
    for part in [first, second] {
        stream
            .write_all(format!("{:x}\r\n", part.len()).as_bytes())
            .await?;
        stream.write_all(part).await?;
        stream.write_all(b"\r\n").await?;
    }
    stream.write_all(b"0\r\n\r\n").await?;
    stream.flush().await
}
