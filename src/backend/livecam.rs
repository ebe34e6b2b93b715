//! Streamed backend: a live camera whose frames arrive continuously
//! over a broadcast connection, decoupled from the requests that want
//! one of them.
//!
//! Capture requests do not drive the device; they park in one of two
//! single-occupancy listener slots (preview / capture) and the arbiter
//! hands the next inbound frame to whichever slots are occupied. A
//! request for a kind that is already pending is dropped with a
//! warning, never queued. No timeout is imposed: a request issued
//! during a broadcast outage waits until reconnection delivers a
//! frame.

use crate::broadcast::{BroadcastClient, LinkState};
use crate::config::{BoothConfig, LivecamConfig};
use crate::errors::CameraError;
use crate::pipeline::PhotoPipeline;
use crate::sample::take_sample_picture;
use crate::types::{timestamp, CaptureKind, CaptureOutput, CaptureResult};
use bytes::Bytes;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// At most one pending listener per kind; the slot is cleared exactly
/// once, when the arbiter fires it.
#[derive(Default)]
struct ListenerSlots {
    preview: Option<oneshot::Sender<Bytes>>,
    capture: Option<oneshot::Sender<Bytes>>,
}

impl ListenerSlots {
    fn slot(&mut self, kind: CaptureKind) -> &mut Option<oneshot::Sender<Bytes>> {
        match kind {
            CaptureKind::Preview => &mut self.preview,
            CaptureKind::Full => &mut self.capture,
        }
    }
}

/// Live session state: the broadcast client, the arbiter task and the
/// optionally launched broadcaster process.
struct LivecamSession {
    client: Option<BroadcastClient>,
    arbiter: Option<JoinHandle<()>>,
    _server: Option<tokio::process::Child>,
}

impl Drop for LivecamSession {
    fn drop(&mut self) {
        if let Some(arbiter) = self.arbiter.take() {
            arbiter.abort();
        }
        // client reader aborts on drop; the server child is spawned
        // with kill_on_drop.
    }
}

pub struct LivecamCamera {
    config: LivecamConfig,
    pipeline: PhotoPipeline,
    slots: Arc<Mutex<ListenerSlots>>,
    session: Mutex<Option<LivecamSession>>,
}

impl LivecamCamera {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            config: config.livecam.clone(),
            // Live captures are archived untouched; the display and
            // full-size paths coincide.
            pipeline: PhotoPipeline::archival(config),
            slots: Arc::new(Mutex::new(ListenerSlots::default())),
            session: Mutex::new(None),
        }
    }

    /// Launch the configured broadcaster (if any), open the broadcast
    /// connection and start the arbiter.
    ///
    /// Idempotent while a session is held. In simulate mode the
    /// backend becomes ready without a connection.
    pub async fn initialize(&self) -> Result<(), CameraError> {
        if self.is_initialized() {
            log::info!("camera already initialized");
            return Ok(());
        }

        let server = self.spawn_server()?;

        if self.config.simulate {
            log::info!("livecam in simulate mode, skipping broadcast connection");
            return self.store_session(LivecamSession {
                client: None,
                arbiter: None,
                _server: server,
            });
        }

        let client =
            BroadcastClient::connect(&self.config.broadcast_addr, self.config.broadcast_port)
                .await?;
        let arbiter = tokio::spawn(arbiter_loop(client.subscribe(), self.slots.clone()));

        self.store_session(LivecamSession {
            client: Some(client),
            arbiter: Some(arbiter),
            _server: server,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.session.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Actual link state, not just initialization: false while the
    /// broadcast connection is down.
    pub async fn is_connected(&self) -> bool {
        let guard = match self.session.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        match guard.as_ref() {
            None => false,
            Some(session) => match &session.client {
                None => true, // simulate mode has no link to lose
                Some(client) => client.link_state() == LinkState::Connected,
            },
        }
    }

    /// Install a listener for the next inbound frame.
    ///
    /// Returns `None` when a request of the same kind is already
    /// pending: the new request is dropped, its completion is never
    /// produced. Previews resolve with the raw frame; full captures
    /// are archived through the pipeline first.
    pub async fn take_picture(&self, kind: CaptureKind) -> Option<CaptureResult> {
        if !self.is_initialized() {
            return Some(Err(CameraError::NotInitialized));
        }

        if self.config.simulate {
            return Some(
                take_sample_picture(&self.pipeline, kind)
                    .await
                    .map(CaptureOutput::Saved),
            );
        }

        let rx = {
            let mut slots = match self.slots.lock() {
                Ok(slots) => slots,
                Err(_) => {
                    return Some(Err(CameraError::CaptureFailed(
                        "listener lock poisoned".to_string(),
                    )))
                }
            };
            let slot = slots.slot(kind);
            if slot.is_some() {
                log::warn!("{} listener already pending, expect frame drop", kind);
                return None;
            }
            let (tx, rx) = oneshot::channel();
            *slot = Some(tx);
            rx
        };

        let frame = match rx.await {
            Ok(frame) => frame,
            Err(_) => {
                return Some(Err(CameraError::CaptureFailed(
                    "broadcast stream closed before a frame arrived".to_string(),
                )))
            }
        };

        match kind {
            CaptureKind::Preview => Some(Ok(CaptureOutput::Frame(frame))),
            CaptureKind::Full => {
                let filename = CaptureKind::Full.filename(&timestamp());
                Some(
                    self.pipeline
                        .process(frame.to_vec(), &filename)
                        .await
                        .map(CaptureOutput::Saved),
                )
            }
        }
    }

    fn spawn_server(&self) -> Result<Option<tokio::process::Child>, CameraError> {
        let command = match &self.config.server_command {
            Some(command) if !command.is_empty() => command,
            _ => return Ok(None),
        };

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CameraError::ConnectionFailed("empty server command".to_string()))?;

        let child = tokio::process::Command::new(program)
            .args(parts)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CameraError::ConnectionFailed(format!("broadcaster launch: {}", e)))?;

        log::info!("webcam server started ({})", command);
        Ok(Some(child))
    }

    fn store_session(&self, session: LivecamSession) -> Result<(), CameraError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| CameraError::ConnectionFailed("session lock poisoned".to_string()))?;
        if guard.is_some() {
            // Lost an initialize race; the duplicate session tears
            // itself down on drop.
            log::info!("camera already initialized");
            return Ok(());
        }
        *guard = Some(session);
        Ok(())
    }
}

/// Route every inbound frame to the pending listeners.
///
/// Both slots may fire off the same frame; each is taken (cleared)
/// before its sender is used, so no listener can see two frames.
async fn arbiter_loop(mut rx: broadcast::Receiver<Bytes>, slots: Arc<Mutex<ListenerSlots>>) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                let (preview, capture) = match slots.lock() {
                    Ok(mut slots) => (slots.preview.take(), slots.capture.take()),
                    // A poisoned slot lock cannot be arbitrated over.
                    Err(_) => break,
                };
                if let Some(listener) = preview {
                    log::debug!("handling preview video frame");
                    let _ = listener.send(frame.clone());
                }
                if let Some(listener) = capture {
                    log::debug!("handling picture frame");
                    let _ = listener.send(frame);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::debug!("skipped {} stale frames", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
