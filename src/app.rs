//! Application orchestration for the DrishtiIO daemon
//!
//! Owns the client registry, the detection strategy and both TCP servers,
//! plus graceful shutdown. Either listener failing to bind is fatal - the
//! daemon cannot do anything useful with only one channel. Individual
//! client connections failing is never fatal.

use crate::config::AppConfig;
use crate::detect::{create_detector, Detector};
use crate::error::Result;
use crate::streaming::{ClientRegistry, ControlServer, FrameServer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Main application structure that manages both servers
pub struct VisionApp {
    frame_server: FrameServer,
    control_server: Arc<ControlServer>,
    registry: Arc<ClientRegistry>,
    running: Arc<AtomicBool>,
}

impl VisionApp {
    /// Create a new VisionApp instance
    ///
    /// Binds both listeners and builds the configured detection strategy.
    pub fn new(config: &AppConfig) -> Result<Self> {
        log::info!("Initializing DrishtiIO application");

        let detector: Arc<dyn Detector> = Arc::from(create_detector(&config.detection)?);
        let registry = Arc::new(ClientRegistry::new());
        let running = Arc::new(AtomicBool::new(true));

        let frame_server = FrameServer::bind(
            &config.network.frame_address,
            config.network.framing,
            detector,
            Arc::clone(&registry),
            Arc::clone(&running),
        )?;
        let control_server = Arc::new(ControlServer::bind(
            &config.network.control_address,
            Arc::clone(&registry),
            Arc::clone(&running),
        )?);

        Ok(Self {
            frame_server,
            control_server,
            registry,
            running,
        })
    }

    /// Shared shutdown flag, for wiring up a signal handler
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Client registry (shared with both servers)
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Bound frame-channel address
    pub fn frame_addr(&self) -> Result<SocketAddr> {
        self.frame_server.local_addr()
    }

    /// Bound control-channel address
    pub fn control_addr(&self) -> Result<SocketAddr> {
        self.control_server.local_addr()
    }

    /// Run both servers until the shutdown flag is cleared.
    ///
    /// The control accept loop runs on its own named thread; the frame
    /// accept loop runs on the calling thread.
    pub fn run(&self) -> Result<()> {
        let control = Arc::clone(&self.control_server);
        let control_handle = thread::Builder::new()
            .name("control-server".to_string())
            .spawn(move || {
                if let Err(e) = control.run() {
                    log::error!("Control server error: {}", e);
                }
            })?;

        let result = self.frame_server.run();

        // Frame loop ended (shutdown or error); take the control loop down too
        self.running.store(false, Ordering::SeqCst);
        let _ = control_handle.join();

        result
    }

    /// Request shutdown of both accept loops
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        log::info!("DrishtiIO shutdown requested");
    }
}
