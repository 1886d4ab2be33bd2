//! Binary mask primitives shared by the detection strategies
//!
//! A thresholded frame becomes a [`Mask`], which supports the small set of
//! operations the pipeline needs: 3x3 morphology (open/close to suppress
//! speckle noise) and 8-connected component labelling with per-region
//! statistics (area, bounding box, centroid).

/// Binary image mask, one byte per pixel (0 = off, 1 = on)
#[derive(Debug, Clone)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

/// One connected region of set pixels
#[derive(Debug, Clone, Copy)]
pub struct Region {
    /// Number of pixels in the region
    pub area: u32,
    /// Leftmost column
    pub min_x: u32,
    /// Topmost row
    pub min_y: u32,
    /// Rightmost column (inclusive)
    pub max_x: u32,
    /// Bottommost row (inclusive)
    pub max_y: u32,
    sum_x: u64,
    sum_y: u64,
}

impl Region {
    /// Bounding box width in pixels
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Bounding box height in pixels
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Pixel centroid of the region (integer, truncated)
    pub fn centroid(&self) -> (u32, u32) {
        // area is always >= 1 for an emitted region
        (
            (self.sum_x / self.area as u64) as u32,
            (self.sum_y / self.area as u64) as u32,
        )
    }
}

impl Mask {
    /// Create an all-off mask
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Read one pixel; out-of-bounds reads as off
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.width + x] != 0
    }

    /// Set one pixel
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x] = on as u8;
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0).count()
    }

    /// 3x3 erosion: a pixel survives only if its full neighborhood is set.
    /// Pixels outside the mask count as off, so set pixels on the border erode.
    pub fn erode(&self) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let mut all = true;
                'kernel: for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx < 0
                            || ny < 0
                            || !self.get(nx as usize, ny as usize)
                        {
                            all = false;
                            break 'kernel;
                        }
                    }
                }
                if all {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// 3x3 dilation: a pixel turns on if any neighbor is set
    pub fn dilate(&self) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let mut any = false;
                'kernel: for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx >= 0 && ny >= 0 && self.get(nx as usize, ny as usize) {
                            any = true;
                            break 'kernel;
                        }
                    }
                }
                if any {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// Morphological open (erode then dilate) - removes speckle noise
    pub fn open(&self) -> Mask {
        self.erode().dilate()
    }

    /// Morphological close (dilate then erode) - fills small holes
    pub fn close(&self) -> Mask {
        self.dilate().erode()
    }

    /// Label 8-connected regions and collect their statistics.
    ///
    /// Regions come back in scan order (topmost-leftmost seed first).
    pub fn regions(&self) -> Vec<Region> {
        let mut visited = vec![false; self.width * self.height];
        let mut regions = Vec::new();
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for sy in 0..self.height {
            for sx in 0..self.width {
                let idx = sy * self.width + sx;
                if visited[idx] || self.data[idx] == 0 {
                    continue;
                }

                let mut region = Region {
                    area: 0,
                    min_x: sx as u32,
                    min_y: sy as u32,
                    max_x: sx as u32,
                    max_y: sy as u32,
                    sum_x: 0,
                    sum_y: 0,
                };

                visited[idx] = true;
                stack.push((sx, sy));

                while let Some((x, y)) = stack.pop() {
                    region.area += 1;
                    region.sum_x += x as u64;
                    region.sum_y += y as u64;
                    region.min_x = region.min_x.min(x as u32);
                    region.min_y = region.min_y.min(y as u32);
                    region.max_x = region.max_x.max(x as u32);
                    region.max_y = region.max_y.max(y as u32);

                    for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let nx = x as i32 + dx;
                            let ny = y as i32 + dy;
                            if nx < 0
                                || ny < 0
                                || nx as usize >= self.width
                                || ny as usize >= self.height
                            {
                                continue;
                            }
                            let nidx = ny as usize * self.width + nx as usize;
                            if !visited[nidx] && self.data[nidx] != 0 {
                                visited[nidx] = true;
                                stack.push((nx as usize, ny as usize));
                            }
                        }
                    }
                }

                regions.push(region);
            }
        }

        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(mask: &mut Mask, x0: usize, y0: usize, w: usize, h: usize) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y, true);
            }
        }
    }

    #[test]
    fn test_open_removes_speckle_keeps_blob() {
        let mut mask = Mask::new(20, 20);
        filled_rect(&mut mask, 5, 5, 8, 8);
        // Single stray pixel far from the blob
        mask.set(18, 2, true);

        let opened = mask.open();
        assert!(!opened.get(18, 2));
        // Interior of the blob survives, bounds restored by the dilation
        assert!(opened.get(5, 5));
        assert!(opened.get(12, 12));
        assert_eq!(opened.count(), 64);
    }

    #[test]
    fn test_close_fills_hole() {
        let mut mask = Mask::new(20, 20);
        filled_rect(&mut mask, 5, 5, 8, 8);
        mask.set(8, 8, false);

        let closed = mask.close();
        assert!(closed.get(8, 8));
    }

    #[test]
    fn test_regions_stats() {
        let mut mask = Mask::new(30, 30);
        filled_rect(&mut mask, 2, 3, 4, 5);
        filled_rect(&mut mask, 20, 20, 6, 6);

        let regions = mask.regions();
        assert_eq!(regions.len(), 2);

        let first = &regions[0];
        assert_eq!(first.area, 20);
        assert_eq!((first.min_x, first.min_y), (2, 3));
        assert_eq!((first.max_x, first.max_y), (5, 7));
        assert_eq!(first.width(), 4);
        assert_eq!(first.height(), 5);
        assert_eq!(first.centroid(), (3, 5));

        let second = &regions[1];
        assert_eq!(second.area, 36);
        assert_eq!(second.centroid(), (22, 22));
    }

    #[test]
    fn test_diagonal_pixels_are_one_region() {
        let mut mask = Mask::new(10, 10);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask.set(3, 3, true);

        let regions = mask.regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = Mask::new(10, 10);
        assert!(mask.regions().is_empty());
        assert_eq!(mask.count(), 0);
    }
}
