//! Transport seam and its TCP implementation.
//!
//! The game server speaks a synchronous request/reply protocol: one
//! outstanding request at a time per connection. Frames are
//! little-endian `{code: u32, len: u32, payload}`, where `code` is the
//! action on the way out and the result status on the way back.
//!
//! [`Transport`] is the boundary the engine is tested against; the
//! production implementation is [`TcpTransport`].

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use serde_json::Value;
use std::io;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
};
use tracing::debug;

use crate::{
    error::{DecodeError, FetchError, TransportError},
    json,
    proto::{Action, Layer, Status},
};

/// One reply frame from the server.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Reply {
    /// Fails with [`TransportError::Rejected`] unless the status is OK.
    pub fn ok(&self) -> Result<(), TransportError> {
        if self.status.is_ok() {
            return Ok(());
        }
        Err(TransportError::Rejected {
            code: self.status.code(),
            detail: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }

    /// Parses the body as a JSON tree.
    pub fn json(&self) -> Result<Value, DecodeError> {
        json::parse(&self.body)
    }
}

/// Request/reply primitive against the game server.
#[async_trait]
pub trait Transport: Send {
    /// Sends one request frame. `None` sends an empty payload.
    async fn send(&mut self, action: Action, payload: Option<&Value>)
        -> Result<(), TransportError>;

    /// Receives one reply frame.
    async fn receive(&mut self) -> Result<Reply, TransportError>;
}

/// [`Transport`] over any byte stream, with the wire framing above.
#[derive(Debug)]
pub struct FramedTransport<S> {
    stream: S,
}

impl<S> FramedTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(
        &mut self,
        action: Action,
        payload: Option<&Value>,
    ) -> Result<(), TransportError> {
        let body = match payload {
            Some(v) => serde_json::to_vec(v).map_err(|e| {
                TransportError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
            })?,
            None => Vec::new(),
        };

        let mut buf = BytesMut::with_capacity(8 + body.len());
        buf.put_u32_le(action.code());
        buf.put_u32_le(body.len() as u32);
        buf.extend_from_slice(&body);
        self.stream.write_all(&buf).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply, TransportError> {
        let mut header = [0u8; 8];
        match self.stream.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(TransportError::ConnectionClosed)
            }
            Err(e) => return Err(TransportError::Io(e)),
        }

        let code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let mut body = vec![0u8; len];
        match self.stream.read_exact(&mut body).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(TransportError::ConnectionClosed)
            }
            Err(e) => return Err(TransportError::Io(e)),
        }

        Ok(Reply {
            status: Status::from_code(code),
            body,
        })
    }
}

/// Production transport over TCP.
pub type TcpTransport = FramedTransport<TcpStream>;

impl TcpTransport {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

/// Requests one map layer and returns its decoded JSON body.
pub async fn request_layer<T: Transport + ?Sized>(
    transport: &mut T,
    layer: Layer,
) -> Result<Value, FetchError> {
    let payload = serde_json::json!({ "layer": layer.code() });
    transport.send(Action::Map, Some(&payload)).await?;
    let reply = transport.receive().await?;
    reply.ok()?;
    Ok(reply.json()?)
}

/// Opens an observer session under the given display name.
pub async fn login<T: Transport + ?Sized>(
    transport: &mut T,
    name: &str,
) -> Result<(), TransportError> {
    let payload = serde_json::json!({ "name": name });
    transport.send(Action::Login, Some(&payload)).await?;
    let reply = transport.receive().await?;
    reply.ok()?;
    debug!(name, "logged in");
    Ok(())
}

/// Closes the session. Best-effort on teardown paths.
pub async fn logout<T: Transport + ?Sized>(transport: &mut T) -> Result<(), TransportError> {
    transport.send(Action::Logout, None).await?;
    let reply = transport.receive().await?;
    reply.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn send_writes_framed_request() {
        let (client, mut server) = duplex(1024);
        let mut transport = FramedTransport::new(client);

        let payload = serde_json::json!({ "layer": 0 });
        transport.send(Action::Map, Some(&payload)).await.unwrap();

        let mut header = [0u8; 8];
        server.read_exact(&mut header).await.unwrap();
        assert_eq!(u32::from_le_bytes(header[0..4].try_into().unwrap()), 10);
        let len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;

        let mut body = vec![0u8; len];
        server.read_exact(&mut body).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["layer"], 0);
    }

    #[tokio::test]
    async fn receive_parses_reply_frame() {
        let (client, mut server) = duplex(1024);
        let mut transport = FramedTransport::new(client);

        let body = br#"{"idx": 3}"#;
        let mut frame = Vec::new();
        frame.extend_from_slice(&0u32.to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(body);
        server.write_all(&frame).await.unwrap();

        let reply = transport.receive().await.unwrap();
        assert_eq!(reply.status, Status::Okey);
        reply.ok().unwrap();
        assert_eq!(reply.json().unwrap()["idx"], 3);
    }

    #[tokio::test]
    async fn rejected_status_carries_code_and_body() {
        let (client, mut server) = duplex(1024);
        let mut transport = FramedTransport::new(client);

        let body = b"access denied";
        let mut frame = Vec::new();
        frame.extend_from_slice(&5u32.to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(body);
        server.write_all(&frame).await.unwrap();

        let reply = transport.receive().await.unwrap();
        assert_eq!(reply.status, Status::AccessDenied);
        match reply.ok() {
            Err(TransportError::Rejected { code: 5, detail }) => {
                assert_eq!(detail, "access denied");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_stream_is_connection_closed() {
        let (client, server) = duplex(1024);
        drop(server);
        let mut transport = FramedTransport::new(client);
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::ConnectionClosed)
        ));
    }
}
