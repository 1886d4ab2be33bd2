//! Detection pipeline: pure functions from a decoded frame to detections
//!
//! Two interchangeable strategies sit behind the [`Detector`] trait:
//!
//! | Strategy | Output | Use case |
//! |----------|--------|----------|
//! | [`BlobDetector`] | Bounding rectangles | Colored object tracking |
//! | [`LineDetector`] | Centroid + steering offset | Line following |
//!
//! The strategy is selected once from configuration via [`create_detector`];
//! the server loop is identical for both. Nothing in this module performs I/O.

pub mod blob;
pub mod line;
pub mod mask;

pub use blob::{BlobDetector, HsvRange};
pub use line::LineDetector;

use crate::config::{DetectionConfig, Strategy};
use crate::error::{Error, Result};
use image::RgbImage;

/// Axis-aligned bounding rectangle of one detected object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One line fix: centroid in full-frame coordinates plus the signed
/// horizontal offset from frame center (positive = line left of center)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFix {
    pub center: (u32, u32),
    pub error: i32,
}

/// Structured result of running the pipeline over one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detections {
    /// Blob mode: zero or more object rectangles
    Objects(Vec<Rect>),
    /// Line mode: at most one fix
    Line(Option<LineFix>),
}

impl Detections {
    /// True when the frame produced no usable detection
    pub fn is_empty(&self) -> bool {
        match self {
            Detections::Objects(rects) => rects.is_empty(),
            Detections::Line(fix) => fix.is_none(),
        }
    }
}

/// A detection strategy: maps one decoded frame to structured detections.
///
/// Implementations are pure with respect to the connection layer and must
/// never fail for a well-formed decoded image; an empty frame simply yields
/// empty detections.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &RgbImage) -> Detections;
}

/// Build the configured detection strategy
pub fn create_detector(config: &DetectionConfig) -> Result<Box<dyn Detector>> {
    match config.strategy {
        Strategy::Blob => {
            if config.blob.ranges.is_empty() {
                return Err(Error::InvalidConfig(
                    "blob strategy requires at least one HSV range".to_string(),
                ));
            }
            Ok(Box::new(BlobDetector::new(
                config.blob.ranges.clone(),
                config.min_area,
            )))
        }
        Strategy::Line => {
            let roi = config.line.roi_fraction;
            if !(roi > 0.0 && roi <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "line roi_fraction must be in (0, 1], got {}",
                    roi
                )));
            }
            Ok(Box::new(LineDetector::new(
                config.line.threshold,
                config.min_area,
                roi,
            )))
        }
    }
}
