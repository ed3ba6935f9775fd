//! Frame type representing a captured image with metadata.

use std::time::Instant;

/// Pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// One byte per pixel (luminance).
    Gray,
    /// Three bytes per pixel, interleaved R, G, B.
    Rgb,
}

impl ColorSpace {
    /// Bytes per pixel for this layout.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
        }
    }
}

/// A single captured frame from the acquisition source.
///
/// Frames are immutable once captured. Stages that need to keep a frame
/// beyond the current cycle either clone it or hold it behind an `Arc`.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data, laid out according to `color`.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Pixel layout.
    color: ColorSpace,
    /// Monotonic capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame stamped with the current instant.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, color: ColorSpace, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            color,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Replaces the capture timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel layout.
    #[inline]
    pub fn color(&self) -> ColorSpace {
        self.color
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions and layout.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * self.color.channels()
    }

    /// Luminance at `(x, y)` for a grayscale frame.
    ///
    /// Returns `None` outside the frame or for color frames.
    #[inline]
    pub fn luma(&self, x: i64, y: i64) -> Option<u8> {
        if self.color != ColorSpace::Gray
            || x < 0
            || y < 0
            || x >= self.width as i64
            || y >= self.height as i64
        {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Converts to a single-channel luminance frame.
    ///
    /// Keeps the timestamp and sequence of the source frame. Grayscale
    /// input is cloned as-is.
    pub fn to_grayscale(&self) -> Frame {
        match self.color {
            ColorSpace::Gray => self.clone(),
            ColorSpace::Rgb => {
                // BT.601 weights in 8-bit fixed point; they sum to 256.
                let pixels = self
                    .pixels
                    .chunks_exact(3)
                    .map(|rgb| {
                        let luma =
                            77 * rgb[0] as u32 + 150 * rgb[1] as u32 + 29 * rgb[2] as u32;
                        (luma >> 8) as u8
                    })
                    .collect();
                Frame {
                    pixels,
                    width: self.width,
                    height: self.height,
                    color: ColorSpace::Gray,
                    timestamp: self.timestamp,
                    sequence: self.sequence,
                }
            }
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color", &self.color)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
