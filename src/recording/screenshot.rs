//! Element screenshots
//!
//! The primary path hands the element to a pluggable [`ElementRenderer`].
//! When that fails, elements that already hold pixels (`img`, `video`,
//! `canvas`) are copied straight into a PNG. Anything else yields `None`.

use async_trait::async_trait;
use base64::Engine;
use image::imageops::FilterType;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

use crate::dom::Element;
use crate::error::{RecorderError, Result};

const RASTER_TAGS: &[&str] = &["img", "video", "canvas"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Output pixels per CSS pixel
    pub scale: f64,
    /// Leave unpainted pixels transparent
    pub transparent_background: bool,
}

impl RenderOptions {
    pub fn for_pixel_ratio(device_pixel_ratio: f64) -> Self {
        let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            scale,
            transparent_background: true,
        }
    }
}

/// Renders an element off-screen into PNG bytes
#[async_trait]
pub trait ElementRenderer: Send + Sync {
    async fn render(&self, element: &Element, options: RenderOptions) -> Result<Vec<u8>>;
}

/// Paints the element's box with its computed background color.
///
/// Enough for the in-memory page model; a browser host plugs in a real
/// renderer instead.
pub struct StyleBoxRenderer;

#[async_trait]
impl ElementRenderer for StyleBoxRenderer {
    async fn render(&self, element: &Element, options: RenderOptions) -> Result<Vec<u8>> {
        let rect = element.bounding_rect();
        let width = (rect.width * options.scale).round();
        let height = (rect.height * options.scale).round();
        if width < 1.0 || height < 1.0 {
            return Err(RecorderError::Screenshot(format!(
                "{:?} has an empty box ({}x{})",
                element, rect.width, rect.height
            )));
        }

        let fill = parse_css_color(&element.computed_style("background-color"))
            .filter(|color| color[3] > 0 || !options.transparent_background)
            .unwrap_or(if options.transparent_background {
                [0, 0, 0, 0]
            } else {
                [255, 255, 255, 255]
            });

        let image = RgbaImage::from_pixel(width as u32, height as u32, Rgba(fill));
        encode_png(&image)
    }
}

pub struct ScreenshotAdapter {
    renderer: Option<Arc<dyn ElementRenderer>>,
}

impl ScreenshotAdapter {
    pub fn new(renderer: Arc<dyn ElementRenderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }

    /// Adapter with only the raster fallback
    pub fn fallback_only() -> Self {
        Self { renderer: None }
    }

    /// Capture `element` as a PNG data URI. Never fails; `None` means no
    /// visual evidence could be produced.
    pub async fn capture(&self, element: &Element, device_pixel_ratio: f64) -> Option<String> {
        if let Some(renderer) = &self.renderer {
            match renderer
                .render(element, RenderOptions::for_pixel_ratio(device_pixel_ratio))
                .await
            {
                Ok(png) => return Some(png_data_uri(&png)),
                Err(e) => tracing::warn!("Element render failed for {:?}: {}", element, e),
            }
        }

        match raster_capture(element) {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::debug!("Raster fallback unavailable for {:?}: {}", element, e);
                None
            }
        }
    }
}

impl Default for ScreenshotAdapter {
    fn default() -> Self {
        Self::new(Arc::new(StyleBoxRenderer))
    }
}

/// Copy the pixels of a raster element, scaled to its layout box
fn raster_capture(element: &Element) -> Result<String> {
    if !RASTER_TAGS.contains(&element.tag_name()) {
        return Err(RecorderError::Screenshot(format!(
            "<{}> is not raster-capable",
            element.tag_name()
        )));
    }

    let raster = element
        .raster()
        .ok_or_else(|| RecorderError::Screenshot("element has no pixel data".to_string()))?;
    let source = RgbaImage::from_raw(raster.width, raster.height, raster.rgba)
        .ok_or_else(|| RecorderError::Screenshot("pixel buffer does not match dimensions".to_string()))?;

    let rect = element.bounding_rect();
    let width = rect.width.round() as u32;
    let height = rect.height.round() as u32;
    let image = if width == 0 || height == 0 || (width == source.width() && height == source.height()) {
        source
    } else {
        image::imageops::resize(&source, width, height, FilterType::Triangle)
    };

    Ok(png_data_uri(&encode_png(&image)?))
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RecorderError::Encoding(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// `rgb(r, g, b)`, `rgba(r, g, b, a)` and `#rrggbb`
fn parse_css_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some([channel(0)?, channel(2)?, channel(4)?, 255]);
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = match parts.get(3) {
        Some(alpha) => (alpha.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
        None => 255,
    };
    Some([r, g, b, a])
}
