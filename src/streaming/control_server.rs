//! Control server: per-client registration and liveness
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Client connects to the control port
//! 2. Its IP is registered in the client registry
//! 3. The handler reads purely to detect disconnect (no inbound payload
//!    is expected on this channel)
//! 4. Zero-byte read or read error -> unregister and close
//! ```
//!
//! A new connection from the same IP supersedes the old registration; the
//! registry shuts the old socket down so its handler exits promptly. There
//! is no reconnect logic here - clients simply connect again.

use crate::error::Result;
use crate::streaming::registry::ClientRegistry;
use std::io::Read;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Control-channel TCP server
pub struct ControlServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    running: Arc<AtomicBool>,
}

impl ControlServer {
    /// Bind the control listener. A bind failure here is fatal to the daemon.
    pub fn bind(
        address: &str,
        registry: Arc<ClientRegistry>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address)?;
        listener.set_nonblocking(true)?;
        log::info!("Control server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
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
                    log::info!("[CONTROL] Connected from {}", addr.ip());

                    let registry = Arc::clone(&self.registry);
                    let _handle = thread::Builder::new()
                        .name(format!("control-{}", addr.ip()))
                        .spawn(move || {
                            handle_client(stream, addr, registry);
                        })?;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No connection pending
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    log::error!("Control accept error: {}", e);
                }
            }
        }

        log::info!("Control server stopped");
        Ok(())
    }
}

/// Register, then hold the connection open purely to detect liveness
fn handle_client(mut stream: TcpStream, addr: SocketAddr, registry: Arc<ClientRegistry>) {
    let ip = addr.ip();

    let writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(e) => {
            log::error!("[CONTROL] Failed to clone stream for {}: {}", ip, e);
            return;
        }
    };
    let generation = registry.register(ip, writer);

    let mut scratch = [0u8; 128];
    loop {
        match stream.read(&mut scratch) {
            Ok(0) => break,
            Ok(n) => {
                // Nothing is expected inbound on this channel
                log::debug!("[CONTROL] Ignoring {} unexpected bytes from {}", n, ip);
            }
            Err(e) => {
                log::debug!("[CONTROL] Read error from {}: {}", ip, e);
                break;
            }
        }
    }

    registry.unregister(ip, generation);
    let _ = stream.shutdown(Shutdown::Both);
    log::info!("[CONTROL] Disconnected {}", ip);
}
