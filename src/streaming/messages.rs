//! JSON wire shapes for detection results
//!
//! The control channel carries one JSON object per processed frame:
//!
//! - object mode: `{"objects": [[x, y, w, h], ...]}`
//! - line mode: `{"line_center": [x, y] | null, "error": int | null}`
//!
//! `error` is present exactly when `line_center` is; both come from the
//! same optional [`LineFix`](crate::detect::LineFix).

use crate::detect::Detections;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Detection result message as sent on the control channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionMessage {
    /// Blob mode payload
    Objects {
        /// One `[x, y, w, h]` entry per detected object
        objects: Vec<[u32; 4]>,
    },
    /// Line mode payload
    Line {
        line_center: Option<[u32; 2]>,
        error: Option<i32>,
    },
}

impl From<&Detections> for DetectionMessage {
    fn from(detections: &Detections) -> Self {
        match detections {
            Detections::Objects(rects) => DetectionMessage::Objects {
                objects: rects.iter().map(|r| [r.x, r.y, r.w, r.h]).collect(),
            },
            Detections::Line(fix) => DetectionMessage::Line {
                line_center: fix.map(|f| [f.center.0, f.center.1]),
                error: fix.map(|f| f.error),
            },
        }
    }
}

impl DetectionMessage {
    /// Serialize to the UTF-8 JSON wire payload
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a control-channel payload
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}
