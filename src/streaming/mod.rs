//! TCP streaming module for DrishtiIO

pub mod control_server;
pub mod frame_server;
pub mod messages;
pub mod registry;
pub mod wire;

pub use control_server::ControlServer;
pub use frame_server::FrameServer;
pub use messages::DetectionMessage;
pub use registry::{ClientRegistry, ControlSender};
pub use wire::{Framing, MessageKind, WireMessage};
