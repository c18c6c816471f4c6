use bitvec::{bitbox, boxed::BitBox, order::Lsb0};
use image::{ImageBuffer, Luma, RgbImage};

/// Gradient magnitude image as returned by `imageproc::gradients::sobel_gradients`.
pub(crate) type GradientImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// A coarse, bit-packed edge map.
///
/// The full resolution gradient magnitude is max-pooled into square blocks of
/// `block` pixels, each block stored as a single bit. A block is set if any pixel
/// inside it exceeded the edge threshold. Looking up whether a pixel lies near a
/// real brightness edge is then a single bit access.
///
/// # Fields
/// - `cols`: Number of blocks per row.
/// - `rows`: Number of block rows.
/// - `block`: Side length of a block in pixels.
/// - `data`: One bit per block, row major.
#[derive(Clone, Debug)]
pub struct EdgeGrid {
    cols: u32,
    rows: u32,
    block: u32,
    data: BitBox<usize, Lsb0>,
}

impl EdgeGrid {
    /// Colour of a set block in the diagnostic rendering.
    const EDGE: [u8; 3] = [255, 255, 255];
    /// Colour of an unset block in the diagnostic rendering.
    const BLANK: [u8; 3] = [0, 0, 0];

    /// Creates an empty grid covering an image of `width` x `height` pixels.
    ///
    /// Partial blocks at the right and bottom border are kept, so every pixel maps onto a block.
    pub fn new(width: u32, height: u32, block: u32) -> Self {
        let block = block.max(1);
        let cols = width.div_ceil(block);
        let rows = height.div_ceil(block);
        Self { cols, rows, block, data: bitbox![usize, Lsb0; 0; (cols * rows) as usize] }
    }

    /// Max-pools a gradient magnitude image.
    ///
    /// # Arguments
    /// * `gradients` - The per pixel gradient magnitude.
    /// * `block` - The pooling block size in pixels.
    /// * `threshold` - Magnitudes strictly above this count as edges.
    pub fn from_gradients(gradients: &GradientImage, block: u32, threshold: u16) -> Self {
        let mut grid = Self::new(gradients.width(), gradients.height(), block);
        for (x, y, magnitude) in gradients.enumerate_pixels() {
            if magnitude.0[0] > threshold {
                grid.set_block(x / grid.block, y / grid.block);
            }
        }
        grid
    }

    fn block_index(&self, col: u32, row: u32) -> usize { (row * self.cols + col) as usize }

    fn set_block(&mut self, col: u32, row: u32) {
        let index = self.block_index(col, row);
        self.data.set(index, true);
    }

    /// Checks whether the block containing pixel `(x, y)` contains an edge.
    ///
    /// Pixels outside the covered image are never on an edge.
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        let (col, row) = (x / self.block, y / self.block);
        if col >= self.cols || row >= self.rows {
            return false;
        }
        self.data.get(self.block_index(col, row)).is_some_and(|bit| *bit)
    }

    /// Number of blocks flagged as edges.
    pub fn edge_blocks(&self) -> usize { self.data.count_ones() }

    /// Renders the grid back at pixel resolution for diagnostics.
    pub fn to_rgb_image(&self, width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgb(if self.is_edge(x, y) { Self::EDGE } else { Self::BLANK })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooling_marks_whole_block() {
        let mut gradients = GradientImage::new(12, 12);
        gradients.put_pixel(6, 7, Luma([500]));
        let grid = EdgeGrid::from_gradients(&gradients, 5, 100);

        assert_eq!(grid.edge_blocks(), 1);
        for x in 5..10 {
            for y in 5..10 {
                assert!(grid.is_edge(x, y));
            }
        }
        assert!(!grid.is_edge(4, 7));
        assert!(!grid.is_edge(10, 7));
        assert!(!grid.is_edge(100, 100));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut gradients = GradientImage::new(10, 10);
        gradients.put_pixel(0, 0, Luma([100]));
        gradients.put_pixel(9, 9, Luma([101]));
        let grid = EdgeGrid::from_gradients(&gradients, 5, 100);

        assert!(!grid.is_edge(0, 0));
        assert!(grid.is_edge(9, 9));
    }

    #[test]
    fn test_partial_border_blocks() {
        let mut gradients = GradientImage::new(11, 11);
        gradients.put_pixel(10, 10, Luma([u16::MAX]));
        let grid = EdgeGrid::from_gradients(&gradients, 5, 0);

        assert!(grid.is_edge(10, 10));
        assert_eq!(grid.to_rgb_image(11, 11).get_pixel(10, 10).0, EdgeGrid::EDGE);
    }
}
