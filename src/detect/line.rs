//! Line-centroid detection strategy
//!
//! Finds a dark line on light ground in the lower band of the frame and
//! reports its centroid plus a signed steering offset:
//!
//! 1. Grayscale + Gaussian blur
//! 2. Inverted binary threshold (dark pixels become the mask)
//! 3. Restrict to the bottom `roi_fraction` of the frame
//! 4. Morphological open + close
//! 5. Largest connected region above the area threshold wins; its centroid
//!    is reported in full-frame coordinates with
//!    `error = frame_center_x - centroid_x`

use crate::detect::mask::Mask;
use crate::detect::{Detections, Detector, LineFix};
use image::RgbImage;

/// Blur strength before thresholding (roughly a 5x5 Gaussian kernel)
const BLUR_SIGMA: f32 = 1.0;

/// Line detector: grayscale threshold + region-of-interest band
pub struct LineDetector {
    threshold: u8,
    min_area: u32,
    roi_fraction: f32,
}

impl LineDetector {
    pub fn new(threshold: u8, min_area: u32, roi_fraction: f32) -> Self {
        Self {
            threshold,
            min_area,
            roi_fraction,
        }
    }
}

impl Detector for LineDetector {
    fn detect(&self, frame: &RgbImage) -> Detections {
        let width = frame.width();
        let height = frame.height();
        if width == 0 || height == 0 {
            return Detections::Line(None);
        }

        let gray = image::imageops::grayscale(frame);
        let blurred = image::imageops::blur(&gray, BLUR_SIGMA);

        // Search only the bottom band, where the line is under the robot
        let roi_top = (height as f32 * (1.0 - self.roi_fraction)) as u32;
        let roi_height = height - roi_top;

        let mut mask = Mask::new(width as usize, roi_height as usize);
        for y in 0..roi_height {
            for x in 0..width {
                let luma = blurred.get_pixel(x, roi_top + y)[0];
                if luma < self.threshold {
                    mask.set(x as usize, y as usize, true);
                }
            }
        }
        let mask = mask.open().close();

        let best = mask
            .regions()
            .into_iter()
            .filter(|region| region.area > self.min_area)
            .max_by_key(|region| region.area);

        let Some(region) = best else {
            return Detections::Line(None);
        };

        let (cx, cy_roi) = region.centroid();
        let center = (cx, cy_roi + roi_top);
        let error = (width / 2) as i32 - cx as i32;

        Detections::Line(Some(LineFix { center, error }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// White frame with a black vertical band covering rows `y0..height`
    fn frame_with_band(width: u32, height: u32, x0: u32, x1: u32, y0: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        for y in y0..height {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        img
    }

    #[test]
    fn test_line_centroid_and_error() {
        // 100x100 frame, dark band x in 40..50 over the bottom half
        let frame = frame_with_band(100, 100, 40, 50, 50);
        let detector = LineDetector::new(60, 100, 0.4);

        let Detections::Line(Some(fix)) = detector.detect(&frame) else {
            panic!("expected a line fix");
        };

        // Centroid near x = 44/45, inside the bottom 40% band
        assert!(fix.center.0.abs_diff(44) <= 2, "cx = {}", fix.center.0);
        assert!(fix.center.1 >= 60, "cy = {}", fix.center.1);
        assert!(fix.center.1 < 100, "cy = {}", fix.center.1);

        // Line left of center gives a positive steering error
        assert_eq!(fix.error, 50 - fix.center.0 as i32);
        assert!(fix.error > 0);
    }

    #[test]
    fn test_line_outside_roi_ignored() {
        // Dark band only in the top half; bottom 40% is clean
        let mut frame = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        for y in 0..40 {
            for x in 40..50 {
                frame.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let detector = LineDetector::new(60, 100, 0.4);

        assert_eq!(detector.detect(&frame), Detections::Line(None));
    }

    #[test]
    fn test_blank_frame_yields_none() {
        let frame = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let detector = LineDetector::new(60, 100, 0.4);

        assert_eq!(detector.detect(&frame), Detections::Line(None));
    }

    #[test]
    fn test_largest_region_wins() {
        // Narrow band left, wide band right; the wide one must be picked
        let mut frame = frame_with_band(120, 100, 10, 16, 60);
        for y in 60..100 {
            for x in 80..100 {
                frame.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let detector = LineDetector::new(60, 100, 0.4);

        let Detections::Line(Some(fix)) = detector.detect(&frame) else {
            panic!("expected a line fix");
        };
        assert!(fix.center.0 >= 80, "cx = {}", fix.center.0);
        // Line right of center gives a negative steering error
        assert!(fix.error < 0);
    }
}
