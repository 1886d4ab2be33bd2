//! Frame server: ingest JPEG frames, run detection, dispatch results
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Robot connects to the frame port
//! 2. Server spawns a handler thread for this connection
//! 3. Loop: read framed JPEG -> decode -> detect -> dispatch via registry
//! 4. Loop ends on end-of-stream; the thread exits
//! ```
//!
//! # Error Policy
//!
//! - Undecodable frame: logged, skipped, connection stays open
//! - Dispatch write failure: that identity is unregistered (its control
//!   connection is presumed dead); the frame connection is unaffected
//! - No control registration for the peer: detections are dropped silently
//! - Transport error: this connection's handler exits; nothing else is touched
//!
//! Frames from one connection are processed strictly in arrival order, so
//! detections reach the control channel in the same order. Different
//! connections decode in parallel on their own threads.

use crate::detect::Detector;
use crate::error::Result;
use crate::streaming::messages::DetectionMessage;
use crate::streaming::registry::ClientRegistry;
use crate::streaming::wire::{Framing, MessageKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Frame-channel TCP server
pub struct FrameServer {
    listener: TcpListener,
    framing: Framing,
    detector: Arc<dyn Detector>,
    registry: Arc<ClientRegistry>,
    running: Arc<AtomicBool>,
}

impl FrameServer {
    /// Bind the frame listener. A bind failure here is fatal to the daemon.
    pub fn bind(
        address: &str,
        framing: Framing,
        detector: Arc<dyn Detector>,
        registry: Arc<ClientRegistry>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address)?;
        listener.set_nonblocking(true)?;
        log::info!("Frame server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            framing,
            detector,
            registry,
            running,
        })
    }

    /// Actual bound address (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Returns when the running flag is cleared.
    pub fn run(&self) -> Result<()> {
        while self.running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::error!("Failed to set blocking mode for {}: {}", addr, e);
                        continue;
                    }
                    log::info!("[FRAME] Connected from {}", addr);

                    let framing = self.framing;
                    let detector = Arc::clone(&self.detector);
                    let registry = Arc::clone(&self.registry);
                    let _handle = thread::Builder::new()
                        .name(format!("frame-{}", addr.ip()))
                        .spawn(move || {
                            handle_client(stream, addr, framing, detector, registry);
                        })?;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No connection pending
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    log::error!("Frame accept error: {}", e);
                }
            }
        }

        log::info!("Frame server stopped");
        Ok(())
    }
}

/// Per-connection loop: read -> decode -> detect -> dispatch
fn handle_client(
    mut stream: TcpStream,
    addr: SocketAddr,
    framing: Framing,
    detector: Arc<dyn Detector>,
    registry: Arc<ClientRegistry>,
) {
    let ip = addr.ip();
    let mut send_buf = Vec::with_capacity(4096);
    let mut frame_count = 0u64;

    loop {
        let message = match framing.read_message(&mut stream, MessageKind::Jpeg) {
            Ok(Some(message)) => message,
            Ok(None) => {
                log::info!("[FRAME] Client {} disconnected ({} frames)", ip, frame_count);
                break;
            }
            Err(e) => {
                log::warn!("[FRAME] Read error from {}: {}", ip, e);
                break;
            }
        };

        if message.kind != MessageKind::Jpeg {
            log::warn!("[FRAME] Unexpected {:?} message from {}, skipping", message.kind, ip);
            continue;
        }

        // A bad frame never terminates the connection
        let frame = match image::load_from_memory(&message.payload) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(e) => {
                log::warn!("[FRAME] Received bad frame from {}, skipping: {}", ip, e);
                continue;
            }
        };

        frame_count += 1;
        let detections = detector.detect(&frame);
        log::trace!("[FRAME] {} frame {}: {:?}", ip, frame_count, detections);

        // No control registration means the detections are dropped; the
        // control channel is optional telemetry, not an acknowledgment.
        let Some(sender) = registry.lookup(&ip) else {
            log::debug!("[FRAME] No control registration for {}, dropping result", ip);
            continue;
        };

        let payload = match DetectionMessage::from(&detections).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("[FRAME] Failed to serialize detections: {}", e);
                continue;
            }
        };
        if let Err(e) = framing.encode(MessageKind::Json, &payload, &mut send_buf) {
            log::error!("[FRAME] Failed to frame detections: {}", e);
            continue;
        }

        if let Err(e) = sender.send(&send_buf) {
            log::warn!("[CONTROL] Failed to send to {}: {}", ip, e);
            // Control connection presumed dead; frame connection stays up
            registry.unregister(ip, sender.generation());
        }
    }
}
