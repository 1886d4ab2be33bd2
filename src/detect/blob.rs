//! Blob-threshold detection strategy
//!
//! Pipeline per frame:
//!
//! 1. Convert each pixel RGB -> HSV (hue 0-179, sat/val 0-255)
//! 2. OR the configured inclusive ranges into a binary mask
//! 3. Morphological open + close to suppress speckle noise
//! 4. 8-connected component labelling
//! 5. Keep regions whose area exceeds the configured threshold,
//!    emit one bounding rectangle per survivor

use crate::detect::mask::Mask;
use crate::detect::{Detections, Detector, Rect};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One inclusive HSV range.
///
/// Components are `[hue, saturation, value]` with hue on the 0-179 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    /// True if the pixel falls inside the range on all three channels
    pub fn contains(&self, hsv: (u8, u8, u8)) -> bool {
        let (h, s, v) = hsv;
        h >= self.lower[0]
            && h <= self.upper[0]
            && s >= self.lower[1]
            && s <= self.upper[1]
            && v >= self.lower[2]
            && v <= self.upper[2]
    }
}

/// Convert one RGB pixel to HSV on the 0-179 / 0-255 / 0-255 scale.
///
/// Hue wraps at 180, so red sits around both 0 and 179. Thresholds for
/// wrap-around colors are expressed as two ranges in the configuration.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let v = max;
    let s = if max == 0 {
        0
    } else {
        (delta * 255.0 / max as f32).round() as u8
    };

    if delta == 0.0 {
        return (0, s, v);
    }

    let hue_deg = if max == r {
        60.0 * (((g as f32 - b as f32) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b as f32 - r as f32) / delta + 2.0)
    } else {
        60.0 * ((r as f32 - g as f32) / delta + 4.0)
    };
    let hue_deg = if hue_deg < 0.0 { hue_deg + 360.0 } else { hue_deg };

    // Halved to fit 0-179
    let h = (hue_deg / 2.0).round() as u16 % 180;
    (h as u8, s, v)
}

/// Blob detector: HSV ranges + minimum region area
pub struct BlobDetector {
    ranges: Vec<HsvRange>,
    min_area: u32,
}

impl BlobDetector {
    pub fn new(ranges: Vec<HsvRange>, min_area: u32) -> Self {
        Self { ranges, min_area }
    }

    fn threshold(&self, frame: &RgbImage) -> Mask {
        let mut mask = Mask::new(frame.width() as usize, frame.height() as usize);
        for (x, y, pixel) in frame.enumerate_pixels() {
            let hsv = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
            if self.ranges.iter().any(|range| range.contains(hsv)) {
                mask.set(x as usize, y as usize, true);
            }
        }
        mask
    }
}

impl Detector for BlobDetector {
    fn detect(&self, frame: &RgbImage) -> Detections {
        let mask = self.threshold(frame).open().close();

        let rects = mask
            .regions()
            .into_iter()
            .filter(|region| region.area > self.min_area)
            .map(|region| Rect {
                x: region.min_x,
                y: region.min_y,
                w: region.width(),
                h: region.height(),
            })
            .collect();

        Detections::Objects(rects)
    }
}
