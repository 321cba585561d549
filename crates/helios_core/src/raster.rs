//! Output raster buffer with disjoint row hand-out for workers.

use crate::color::Rgb8;

/// The output image for one render session.
///
/// The buffer is owned by the session while rendering and returned to
/// the caller on completion. Each pixel is written by exactly one
/// worker: `interleaved_rows_mut` hands out non-overlapping `&mut`
/// row slices, so no locking is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb8>,
}

impl RasterBuffer {
    /// Create a new raster buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb8::BLACK; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Rgb8 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// One row as a shared slice.
    pub fn row(&self, y: u32) -> &[Rgb8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// One row as a mutable slice.
    pub fn row_mut(&mut self, y: u32) -> &mut [Rgb8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.pixels[start..start + w]
    }

    /// Split the buffer into `total` disjoint row sets, row `y` going
    /// to set `y % total`.
    ///
    /// Every row appears in exactly one set, so the sets can be moved
    /// into worker threads and written without synchronization.
    pub fn interleaved_rows_mut(&mut self, total: u32) -> Vec<Vec<(u32, &mut [Rgb8])>> {
        assert!(total >= 1, "at least one row set is required");
        let width = self.width as usize;
        let mut sets: Vec<Vec<(u32, &mut [Rgb8])>> = (0..total).map(|_| Vec::new()).collect();
        if width == 0 {
            return sets;
        }
        for (y, row) in self.pixels.chunks_exact_mut(width).enumerate() {
            sets[y % total as usize].push((y as u32, row));
        }
        sets
    }

    /// Flatten to RGB bytes (for PNG encoding or display).
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            bytes.extend_from_slice(&[px.r, px.g, px.b]);
        }
        bytes
    }
}
