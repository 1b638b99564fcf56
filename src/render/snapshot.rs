use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::{
        core::{Rect, Rgba8Premul},
        error::{MixscapeError, MixscapeResult},
        math::lerp,
    },
    render::composite::{over, unpremultiply},
    stage::compositor::{Compositor, GradientFill},
};

/// Largest frame edge the snapshot renderer accepts.
pub const MAX_SNAPSHOT_EDGE: u32 = 16_384;

/// A rendered frame as premultiplied RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, premultiplied.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        match self.data.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }

    /// Write as a straight-alpha PNG.
    pub fn save_png(&self, path: &Path) -> MixscapeResult<()> {
        let straight: Vec<u8> = self
            .data
            .chunks_exact(4)
            .flat_map(|px| unpremultiply([px[0], px[1], px[2], px[3]]))
            .collect();
        image::save_buffer_with_format(
            path,
            &straight,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Composite the current stage into one frame: gradient, then each layer back to front.
///
/// Elements whose pixels are not held locally (dimension-only handles) are skipped.
pub fn render_snapshot(stage: &Compositor) -> MixscapeResult<FrameRGBA> {
    let viewport = stage.context().viewport;
    let width = viewport.width.ceil() as u32;
    let height = viewport.height.ceil() as u32;
    if width == 0 || height == 0 || width > MAX_SNAPSHOT_EDGE || height > MAX_SNAPSHOT_EDGE {
        return Err(MixscapeError::validation(format!(
            "snapshot size {width}x{height} is out of range"
        )));
    }

    let mut frame = FrameRGBA::new(width, height);
    if let Some(gradient) = stage.context().gradient {
        fill_gradient(&mut frame, gradient);
    }

    for slot in stage.layers() {
        let controller = slot.controller();
        for node in controller.surface().children() {
            let Some(img) = controller.asset(&node.asset).and_then(|a| a.drawable()) else {
                continue;
            };
            if node.opacity <= 0.0 {
                continue;
            }
            blit_scaled(&mut frame, node.rect, node.opacity as f32, |u, v| {
                let sx = ((u * f64::from(img.width)) as u32).min(img.width.saturating_sub(1));
                let sy = ((v * f64::from(img.height)) as u32).min(img.height.saturating_sub(1));
                img.pixel(sx, sy)
            });
        }
    }
    Ok(frame)
}

fn fill_gradient(frame: &mut FrameRGBA, g: GradientFill) {
    let rows = frame.height.max(2) - 1;
    let width = frame.width as usize;
    for y in 0..frame.height {
        let t = f64::from(y) / f64::from(rows);
        let px = mix(g.top, g.bottom, t);
        let row = (y as usize) * width * 4;
        for x in 0..width {
            frame.data[row + x * 4..row + x * 4 + 4].copy_from_slice(&px);
        }
    }
}

fn mix(a: Rgba8Premul, b: Rgba8Premul, t: f64) -> [u8; 4] {
    let ch = |x: u8, y: u8| lerp(f64::from(x), f64::from(y), t).round().clamp(0.0, 255.0) as u8;
    [ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), ch(a.a, b.a)]
}

/// Nearest-neighbour blit: `sample(u, v)` gets normalized source coordinates.
fn blit_scaled(
    frame: &mut FrameRGBA,
    rect: Rect,
    opacity: f32,
    sample: impl Fn(f64, f64) -> [u8; 4],
) {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }
    let x0 = rect.x0.max(0.0).floor() as u32;
    let y0 = rect.y0.max(0.0).floor() as u32;
    let x1 = (rect.x1.min(f64::from(frame.width))).ceil().max(0.0) as u32;
    let y1 = (rect.y1.min(f64::from(frame.height))).ceil().max(0.0) as u32;

    for y in y0..y1 {
        let cy = f64::from(y) + 0.5;
        if cy < rect.y0 || cy >= rect.y1 {
            continue;
        }
        let v = (cy - rect.y0) / rect.height();
        for x in x0..x1 {
            let cx = f64::from(x) + 0.5;
            if cx < rect.x0 || cx >= rect.x1 {
                continue;
            }
            let u = (cx - rect.x0) / rect.width();
            let i = ((y as usize) * (frame.width as usize) + (x as usize)) * 4;
            let dst = [
                frame.data[i],
                frame.data[i + 1],
                frame.data[i + 2],
                frame.data[i + 3],
            ];
            let out = over(dst, sample(u, v), opacity);
            frame.data[i..i + 4].copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/snapshot.rs"]
mod tests;
