//! Remote render clients: wire protocol, TCP proxy and service loop.
//!
//! A client accepts a row-range request and returns rendered pixels;
//! it is substitutable for a local worker. The wire format is
//! newline-delimited JSON: one `RowRangeRequest` per line from the
//! master, one `ClientReply` per line back. Failure is an explicit
//! reply, distinct from a valid empty row set.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use helios_core::{RenderFault, RenderOptions, Rgb8, RowRenderer};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A registered remote render endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderClientDescriptor {
    pub address: SocketAddr,
    /// Connect and per-request I/O timeout.
    pub timeout_ms: u64,
}

impl RenderClientDescriptor {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout_ms: 10_000,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A row-range task for a remote client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRangeRequest {
    pub width: u32,
    pub height: u32,
    /// The exact rows to render; the reply must cover them all.
    pub rows: Vec<u32>,
    /// Capability flags so the remote side builds an equivalent
    /// renderer.
    pub options: RenderOptions,
}

/// One rendered scanline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRow {
    pub y: u32,
    pub pixels: Vec<Rgb8>,
}

/// What a client sends back for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientReply {
    Rows(Vec<RenderedRow>),
    Failed { reason: String },
}

/// The contract a remote worker fulfils. Mock implementations stand in
/// for the network in tests.
pub trait RenderClient: Send {
    /// Human-readable endpoint label for logs and failure records.
    fn label(&self) -> String;

    fn render_rows(&mut self, request: &RowRangeRequest) -> Result<Vec<RenderedRow>, ClientError>;
}

/// Proxy speaking the JSON-lines protocol over TCP.
pub struct TcpRenderClient {
    descriptor: RenderClientDescriptor,
}

impl TcpRenderClient {
    pub fn new(descriptor: RenderClientDescriptor) -> Self {
        Self { descriptor }
    }
}

impl RenderClient for TcpRenderClient {
    fn label(&self) -> String {
        self.descriptor.address.to_string()
    }

    fn render_rows(&mut self, request: &RowRangeRequest) -> Result<Vec<RenderedRow>, ClientError> {
        let timeout = self.descriptor.timeout();
        let stream = TcpStream::connect_timeout(&self.descriptor.address, timeout).map_err(
            |source| ClientError::Connect {
                address: self.descriptor.address.to_string(),
                source,
            },
        )?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let mut line = serde_json::to_string(request).map_err(|e| ClientError::Malformed {
            reason: format!("encoding request: {e}"),
        })?;
        line.push('\n');
        (&stream).write_all(line.as_bytes()).map_err(classify_io)?;

        let mut reply_line = String::new();
        let mut reader = BufReader::new(&stream);
        let n = reader.read_line(&mut reply_line).map_err(classify_io)?;
        if n == 0 {
            return Err(ClientError::Malformed {
                reason: "connection closed before reply".into(),
            });
        }

        let reply: ClientReply =
            serde_json::from_str(&reply_line).map_err(|e| ClientError::Malformed {
                reason: format!("decoding reply: {e}"),
            })?;

        match reply {
            ClientReply::Rows(rows) => Ok(rows),
            ClientReply::Failed { reason } => Err(ClientError::Remote { reason }),
        }
    }
}

fn classify_io(error: std::io::Error) -> ClientError {
    match error.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ClientError::Timeout,
        _ => ClientError::Io(error),
    }
}

/// Service half of the protocol: answer row-range requests on one
/// connection until the peer disconnects.
///
/// `build` constructs a renderer for each request (the request carries
/// image size and options). A `RenderFault` becomes an explicit
/// `Failed` reply rather than a dropped connection.
pub fn serve_connection(
    stream: TcpStream,
    build: &dyn Fn(&RowRangeRequest) -> Result<Box<dyn RowRenderer>, RenderFault>,
) -> std::io::Result<()> {
    let peer = stream.peer_addr()?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut stream = stream;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            log::debug!("client connection {peer} closed");
            return Ok(());
        }

        let reply = match serde_json::from_str::<RowRangeRequest>(&line) {
            Ok(request) => {
                log::info!(
                    "render request from {peer}: {} rows of {}x{}",
                    request.rows.len(),
                    request.width,
                    request.height
                );
                answer_request(&request, build)
            }
            Err(e) => ClientReply::Failed {
                reason: format!("bad request: {e}"),
            },
        };

        let mut encoded = serde_json::to_string(&reply)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        encoded.push('\n');
        stream.write_all(encoded.as_bytes())?;
    }
}

fn answer_request(
    request: &RowRangeRequest,
    build: &dyn Fn(&RowRangeRequest) -> Result<Box<dyn RowRenderer>, RenderFault>,
) -> ClientReply {
    let mut renderer = match build(request) {
        Ok(renderer) => renderer,
        Err(fault) => {
            return ClientReply::Failed {
                reason: fault.to_string(),
            }
        }
    };

    let mut rows = Vec::with_capacity(request.rows.len());
    for &y in &request.rows {
        let mut pixels = vec![Rgb8::BLACK; request.width as usize];
        if let Err(fault) = renderer.render_row(y, &mut pixels) {
            return ClientReply::Failed {
                reason: format!("row {y}: {fault}"),
            };
        }
        rows.push(RenderedRow { y, pixels });
    }
    ClientReply::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios_core::WorkerCounters;
    use std::net::TcpListener;
    use std::thread;

    struct GradientRenderer;

    impl RowRenderer for GradientRenderer {
        fn render_row(&mut self, y: u32, out: &mut [Rgb8]) -> Result<(), RenderFault> {
            for (x, px) in out.iter_mut().enumerate() {
                *px = Rgb8::new(y as u8, x as u8, 0);
            }
            Ok(())
        }

        fn take_counters(&mut self) -> WorkerCounters {
            WorkerCounters::default()
        }
    }

    fn spawn_server(
        build: impl Fn(&RowRangeRequest) -> Result<Box<dyn RowRenderer>, RenderFault>
            + Send
            + 'static,
    ) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = serve_connection(stream, &build);
            }
        });
        address
    }

    fn request(rows: Vec<u32>) -> RowRangeRequest {
        RowRangeRequest {
            width: 4,
            height: 8,
            rows,
            options: RenderOptions::default(),
        }
    }

    #[test]
    fn test_loopback_dispatch() {
        let address = spawn_server(|_req| Ok(Box::new(GradientRenderer) as Box<dyn RowRenderer>));

        let mut client = TcpRenderClient::new(RenderClientDescriptor::new(address));
        let rows = client.render_rows(&request(vec![1, 3])).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].y, 1);
        assert_eq!(rows[0].pixels[2], Rgb8::new(1, 2, 0));
        assert_eq!(rows[1].pixels.len(), 4);
    }

    #[test]
    fn test_remote_failure_is_classified() {
        let address = spawn_server(|_req| Err(RenderFault::new("no scene loaded")));

        let mut client = TcpRenderClient::new(RenderClientDescriptor::new(address));
        let err = client.render_rows(&request(vec![0])).unwrap_err();
        assert!(matches!(err, ClientError::Remote { .. }));
    }

    #[test]
    fn test_connect_failure_is_classified() {
        // Port 1 on localhost is essentially never listening
        let descriptor = RenderClientDescriptor {
            address: "127.0.0.1:1".parse().unwrap(),
            timeout_ms: 200,
        };
        let mut client = TcpRenderClient::new(descriptor);
        let err = client.render_rows(&request(vec![0])).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Connect { .. } | ClientError::Timeout
        ));
    }

    #[test]
    fn test_empty_row_set_is_a_valid_reply() {
        let address = spawn_server(|_req| Ok(Box::new(GradientRenderer) as Box<dyn RowRenderer>));
        let mut client = TcpRenderClient::new(RenderClientDescriptor::new(address));
        let rows = client.render_rows(&request(Vec::new())).unwrap();
        assert!(rows.is_empty());
    }
}
