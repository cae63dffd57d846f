//! # Drawing Surface
//!
//! An RGBA8 raster standing in for the browser canvas, plus the
//! bounding-box scan that anchors result labels.

use mathpad_error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// A position on the surface, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Smallest axis-aligned rectangle holding every non-transparent pixel.
/// Coordinates are inclusive, and `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// Single pass over an RGBA buffer, testing alpha > 0.
    ///
    /// Returns `None` when no pixel is opaque, so callers never see an
    /// inverted box.
    pub fn scan(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let row = width as usize;
        let limit = row * height as usize;

        let mut found: Option<BoundingBox> = None;
        for (i, px) in rgba.chunks_exact(4).take(limit).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let x = (i % row) as u32;
            let y = (i / row) as u32;
            found = Some(match found {
                None => BoundingBox { min_x: x, min_y: y, max_x: x, max_y: y },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
        found
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) as f32 / 2.0,
            (self.min_y + self.max_y) as f32 / 2.0,
        )
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// RGBA8 pixel buffer, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// A fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::invalid_input(format!(
                "pixel buffer holds {} bytes, {}x{} RGBA needs {}",
                pixels.len(),
                width,
                height,
                expected
            ))
            .with_operation("surface::from_rgba"));
        }
        Ok(Self { width, height, pixels })
    }

    /// Decode PNG bytes into a surface
    pub fn decode_png(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| {
                Error::invalid_input(format!("not a readable PNG: {}", e))
                    .with_operation("surface::decode_png")
                    .set_source(e)
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    /// Load a PNG snapshot from disk
    pub fn load_png(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::from(e).with_context("path", path.display().to_string()))?;
        Self::decode_png(&bytes).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Paint one pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i..i + 4].copy_from_slice(&rgba);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::scan(self.width, self.height, &self.pixels)
    }

    /// Where a new result label goes: the centre of the drawing, or the
    /// centre of the surface when nothing is drawn.
    pub fn label_anchor(&self) -> Point {
        match self.bounding_box() {
            Some(bbox) => bbox.center(),
            None => Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0),
        }
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| Error::unexpected("pixel buffer does not match surface size"))?;

        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| {
                Error::serialization_failed(format!("PNG encoding failed: {}", e))
                    .with_operation("surface::to_png_bytes")
                    .set_source(e)
            })?;
        Ok(out)
    }

    /// PNG snapshot as a `data:image/png;base64,` URI
    pub fn to_data_uri(&self) -> Result<String> {
        use base64::Engine as _;

        let png = self.to_png_bytes()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}
