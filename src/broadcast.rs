//! Frame-broadcast client for the streamed backend.
//!
//! Maintains a persistent TCP connection to the frame-broadcast
//! service and fans inbound frames out over a broadcast channel. The
//! wire format is length-prefixed: a big-endian `u32` byte count
//! followed by the encoded frame. Frames carry no correlation id;
//! arrival order is their only identity.
//!
//! Connection loss never tears the client down: the link cycles
//! `Connected -> Disconnected -> Reconnecting` with a fixed one second
//! delay between attempts, forever. Subscribers simply see no frames
//! during an outage.

use crate::errors::CameraError;
use bytes::Bytes;
use std::sync::{Arc, RwLock};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Frames kept for slow subscribers before they start lagging.
const FRAME_BUFFER: usize = 16;

/// Upper bound on a single frame, rejects nonsense lengths from a
/// corrupted stream.
const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// Observable connection state of the broadcast link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Persistent client for a frame-broadcast endpoint.
#[derive(Debug)]
pub struct BroadcastClient {
    frames: broadcast::Sender<Bytes>,
    link: Arc<RwLock<LinkState>>,
    reader: JoinHandle<()>,
}

impl BroadcastClient {
    /// Open the initial connection and start the reader task.
    ///
    /// Fails only if the first connection cannot be opened; once
    /// running, connection loss is handled by the reconnect loop.
    pub async fn connect(addr: &str, port: u16) -> Result<Self, CameraError> {
        let endpoint = format!("{}:{}", addr, port);
        log::info!("trying to connect to {}", endpoint);

        let stream = TcpStream::connect(&endpoint)
            .await
            .map_err(|e| CameraError::ConnectionFailed(format!("{}: {}", endpoint, e)))?;

        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        let link = Arc::new(RwLock::new(LinkState::Connected));
        let reader = tokio::spawn(read_loop(stream, endpoint, frames.clone(), link.clone()));

        Ok(Self {
            frames,
            link,
            reader,
        })
    }

    /// Subscribe to inbound frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.frames.subscribe()
    }

    /// Current state of the broadcast link. A poisoned state lock
    /// reads as `Disconnected`.
    pub fn link_state(&self) -> LinkState {
        self.link
            .read()
            .map(|s| *s)
            .unwrap_or(LinkState::Disconnected)
    }
}

impl Drop for BroadcastClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    stream: TcpStream,
    endpoint: String,
    frames: broadcast::Sender<Bytes>,
    link: Arc<RwLock<LinkState>>,
) {
    let mut stream = Some(stream);
    loop {
        let mut conn = match stream.take() {
            Some(conn) => conn,
            None => {
                sleep(RECONNECT_DELAY).await;
                set_link(&link, LinkState::Reconnecting);
                match TcpStream::connect(&endpoint).await {
                    Ok(conn) => {
                        log::info!("reconnected to {}", endpoint);
                        set_link(&link, LinkState::Connected);
                        conn
                    }
                    Err(e) => {
                        log::warn!("reconnect to {} failed: {}", endpoint, e);
                        continue;
                    }
                }
            }
        };

        if let Err(e) = pump_frames(&mut conn, &frames).await {
            log::warn!("broadcast connection to {} lost: {}", endpoint, e);
        }
        set_link(&link, LinkState::Disconnected);
    }
}

/// A poisoned state lock leaves the last state in place; readers see
/// `Disconnected` for it anyway.
fn set_link(link: &RwLock<LinkState>, state: LinkState) {
    if let Ok(mut guard) = link.write() {
        *guard = state;
    }
}

/// Read length-prefixed frames until the connection fails.
async fn pump_frames(
    conn: &mut TcpStream,
    frames: &broadcast::Sender<Bytes>,
) -> std::io::Result<()> {
    loop {
        let len = conn.read_u32().await?;
        if len == 0 || len > MAX_FRAME_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("bad frame length: {}", len),
            ));
        }

        let mut buf = vec![0u8; len as usize];
        conn.read_exact(&mut buf).await?;
        log::trace!("received new frame ({} bytes)", len);

        // No subscribers yet means the frame is simply dropped.
        let _ = frames.send(Bytes::from(buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn send_frame(conn: &mut TcpStream, payload: &[u8]) {
        conn.write_u32(payload.len() as u32).await.unwrap();
        conn.write_all(payload).await.unwrap();
        conn.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_failed() {
        // Port 1 is essentially never listening.
        let err = BroadcastClient::connect("127.0.0.1", 1).await.unwrap_err();
        assert_eq!(err.status_code(), -2);
        assert!(err.to_string().contains("connection to webcam failed"));
    }

    #[tokio::test]
    async fn test_frames_reach_subscribers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = BroadcastClient::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();
        assert_eq!(client.link_state(), LinkState::Connected);

        let (mut conn, _) = listener.accept().await.unwrap();
        let mut rx = client.subscribe();

        send_frame(&mut conn, b"frame-one").await;
        let frame = rx.recv().await.unwrap();
        assert_eq!(&frame[..], b"frame-one");

        send_frame(&mut conn, b"frame-two").await;
        let frame = rx.recv().await.unwrap();
        assert_eq!(&frame[..], b"frame-two");
    }

    #[test]
    fn test_poisoned_link_lock_reads_as_disconnected() {
        let link = Arc::new(RwLock::new(LinkState::Connected));
        let poisoner = link.clone();
        std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the link lock");
        })
        .join()
        .unwrap_err();

        // Writes become no-ops, reads degrade to Disconnected.
        set_link(&link, LinkState::Reconnecting);
        let state = link.read().map(|s| *s).unwrap_or(LinkState::Disconnected);
        assert_eq!(state, LinkState::Disconnected);
    }

    #[tokio::test]
    async fn test_zero_length_frame_drops_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = BroadcastClient::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();
        let (mut conn, _) = listener.accept().await.unwrap();

        conn.write_u32(0).await.unwrap();
        conn.flush().await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_ne!(client.link_state(), LinkState::Connected);
    }
}
