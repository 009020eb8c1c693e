//! Film

use crate::camera::*;

/// Number of byte channels per pixel.
pub const CHANNELS: usize = 3;

/// Quantized RGB image. Row-major, three bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Image resolution.
    pub view: View,

    /// Pixel bytes.
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a black image.
    ///
    /// * `view` - Image resolution.
    pub fn new(view: View) -> Self {
        let len = view.width as usize * view.height as usize * CHANNELS;
        Self {
            view,
            data: vec![0; len],
        }
    }

    /// Returns the image width.
    pub fn width(&self) -> u32 {
        self.view.width
    }

    /// Returns the image height.
    pub fn height(&self) -> u32 {
        self.view.height
    }

    /// Returns the raw pixel bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.view.width as usize + x as usize) * CHANNELS
    }

    /// Returns a pixel or `None` if it lies outside the image.
    ///
    /// * `x` - Pixel column.
    /// * `y` - Pixel row.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if !self.view.contains(x, y) {
            return None;
        }
        let o = self.offset(x, y);
        Some([self.data[o], self.data[o + 1], self.data[o + 2]])
    }

    /// Writes one pixel. Returns false if it lies outside the image.
    ///
    /// * `x`   - Pixel column.
    /// * `y`   - Pixel row.
    /// * `rgb` - Colour bytes.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) -> bool {
        if !self.view.contains(x, y) {
            return false;
        }
        let o = self.offset(x, y);
        self.data[o..o + CHANNELS].copy_from_slice(&rgb);
        true
    }

    /// Writes a whole row. Returns false if the row is outside the image or
    /// `pixels` is not exactly `width * 3` bytes.
    ///
    /// * `y`      - Pixel row.
    /// * `pixels` - Row bytes.
    pub fn set_row(&mut self, y: u32, pixels: &[u8]) -> bool {
        let row_len = self.view.width as usize * CHANNELS;
        if y >= self.view.height || pixels.len() != row_len {
            return false;
        }
        let o = self.offset(0, y);
        self.data[o..o + row_len].copy_from_slice(pixels);
        true
    }

    /// Returns the bytes of a row.
    ///
    /// * `y` - Pixel row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.view.height {
            return None;
        }
        let o = self.offset(0, y);
        Some(&self.data[o..o + self.view.width as usize * CHANNELS])
    }
}
