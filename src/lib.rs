//! DrishtiIO - Vision processing daemon for robot camera streaming
//!
//! ## Protocol Architecture
//!
//! - **Frame channel (TCP, port 11000)**: Inbound JPEG camera frames from the robot
//! - **Control channel (TCP, port 11001)**: Outbound JSON detections back to the robot
//!
//! The two channels are independent TCP connections from the same physical
//! client, correlated by peer IP address. When a control client connects, its
//! IP is registered in the client registry; the frame server looks the IP up
//! after every processed frame and pushes the detection results through the
//! registered writer. A frame client without a matching control registration
//! still gets its frames processed, the results are just dropped.

pub mod app;
pub mod config;
pub mod detect;
pub mod error;
pub mod streaming;

// Re-export commonly used types
pub use app::VisionApp;
pub use config::AppConfig;
pub use error::{Error, Result};
