use std::sync::Arc;

use crate::foundation::core::{AssetId, Size};

/// Decoded raster in premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Natural size in pixels.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        match self.rgba8_premul.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

/// Decode state of an asset as delivered by the loading collaborator.
#[derive(Clone, Debug)]
pub enum AssetImage {
    /// Fully decoded drawable.
    Decoded(Arc<DecodedImage>),
    /// Natural dimensions are known; pixels live elsewhere (e.g. a GPU texture).
    Dimensions {
        /// Natural width in pixels.
        width: u32,
        /// Natural height in pixels.
        height: u32,
    },
    /// Still decoding; natural size unknown.
    Pending,
    /// Decode failed or the drawable is missing.
    Failed,
}

/// One source asset a layer may display.
#[derive(Clone, Debug)]
pub struct AssetHandle {
    /// Stable identifier.
    pub id: AssetId,
    /// Source locator (URL or relative path), informational only.
    pub source: String,
    /// Decode state.
    pub image: AssetImage,
}

impl AssetHandle {
    /// Handle for an already decoded image.
    pub fn decoded(id: impl Into<String>, source: impl Into<String>, image: DecodedImage) -> Self {
        Self {
            id: AssetId::new(id),
            source: source.into(),
            image: AssetImage::Decoded(Arc::new(image)),
        }
    }

    /// Handle with known natural dimensions and no local pixels.
    pub fn sized(id: impl Into<String>, width: u32, height: u32) -> Self {
        let id = id.into();
        Self {
            source: id.clone(),
            id: AssetId(id),
            image: AssetImage::Dimensions { width, height },
        }
    }

    /// Handle whose decode has not finished yet.
    pub fn pending(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            source: id.clone(),
            id: AssetId(id),
            image: AssetImage::Pending,
        }
    }

    /// Natural size, if known and non-degenerate.
    pub fn natural_size(&self) -> Option<Size> {
        let size = match &self.image {
            AssetImage::Decoded(img) => img.size(),
            AssetImage::Dimensions { width, height } => {
                Size::new(f64::from(*width), f64::from(*height))
            }
            AssetImage::Pending | AssetImage::Failed => return None,
        };
        (size.width > 0.0 && size.height > 0.0).then_some(size)
    }

    /// Decoded pixels, when held locally.
    pub fn drawable(&self) -> Option<&Arc<DecodedImage>> {
        match &self.image {
            AssetImage::Decoded(img) => Some(img),
            _ => None,
        }
    }

    /// Return `true` while decode is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self.image, AssetImage::Pending)
    }

    /// Return `true` when the asset can never be drawn.
    pub fn is_unavailable(&self) -> bool {
        match self.image {
            AssetImage::Failed => true,
            AssetImage::Pending => false,
            _ => self.natural_size().is_none(),
        }
    }
}

/// Drop assets that can never be drawn, keeping input order.
pub fn filter_available(assets: impl IntoIterator<Item = AssetHandle>) -> Vec<AssetHandle> {
    assets
        .into_iter()
        .filter(|a| {
            let keep = !a.is_unavailable();
            if !keep {
                tracing::debug!(asset = %a.id, "dropping unavailable asset");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/handle.rs"]
mod tests;
