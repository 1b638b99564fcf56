use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    assets::handle::{AssetHandle, AssetImage, DecodedImage},
    foundation::{core::AssetId, error::MixscapeResult},
};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> MixscapeResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Read and decode `root/rel` into an asset handle keyed by `rel`.
///
/// Failures never propagate: the handle comes back as [`AssetImage::Failed`] so the
/// layer simply skips it.
pub fn load_image_file(root: &Path, rel: &str) -> AssetHandle {
    let path = root.join(rel);
    let image = match std::fs::read(&path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(Into::into)
        .and_then(|bytes| decode_image(&bytes))
    {
        Ok(img) => AssetImage::Decoded(Arc::new(img)),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "asset unavailable");
            AssetImage::Failed
        }
    };
    AssetHandle {
        id: AssetId::new(rel),
        source: rel.to_string(),
        image,
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
