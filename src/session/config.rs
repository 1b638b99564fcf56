use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;

use crate::{
    assets::{decode::load_image_file, handle::AssetHandle},
    foundation::{
        core::{Rgba8Premul, Viewport},
        error::{MixscapeError, MixscapeResult},
    },
    layer::params::{LayerKind, LayerParams, LayerParamsOverride, RendererKind},
    stage::compositor::{GradientFill, LayerDescriptor},
};

/// A mix as written on disk: which layers to show and which assets feed them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixConfig {
    /// Display name.
    pub name: String,
    /// Seed for every layer RNG.
    #[serde(default)]
    pub seed: u64,
    /// Initial viewport.
    #[serde(default)]
    pub viewport: Viewport,
    /// Backdrop gradient in straight-alpha RGBA8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientConfig>,
    /// Layers in any order; z depth comes from the layer kind.
    pub layers: Vec<LayerConfig>,
}

/// Two-stop vertical gradient, straight alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GradientConfig {
    /// Top colour `[r, g, b, a]`.
    pub top: [u8; 4],
    /// Bottom colour `[r, g, b, a]`.
    pub bottom: [u8; 4],
}

impl GradientConfig {
    /// Premultiplied fill for the compositor.
    pub fn to_fill(self) -> GradientFill {
        let [r, g, b, a] = self.top;
        let top = Rgba8Premul::from_straight_rgba(r, g, b, a);
        let [r, g, b, a] = self.bottom;
        let bottom = Rgba8Premul::from_straight_rgba(r, g, b, a);
        GradientFill { top, bottom }
    }
}

/// One layer of a mix.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Visual category.
    pub kind: LayerKind,
    /// Renderer override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<RendererKind>,
    /// Asset paths relative to the mix file.
    pub assets: Vec<String>,
    /// Tuning overrides on top of the kind's defaults.
    #[serde(default)]
    pub params: LayerParamsOverride,
}

impl LayerConfig {
    /// Kind defaults with this layer's overrides applied.
    pub fn resolved_params(&self) -> LayerParams {
        LayerParams::for_kind(self.kind).with_overrides(&self.params)
    }
}

impl MixConfig {
    /// Read, parse and validate a mix JSON file.
    pub fn from_path(path: &Path) -> MixscapeResult<Self> {
        let f = File::open(path).with_context(|| format!("open mix '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a mix from a JSON string.
    pub fn from_json(json: &str) -> MixscapeResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject mixes that cannot be rendered.
    pub fn validate(&self) -> MixscapeResult<()> {
        if self.name.trim().is_empty() {
            return Err(MixscapeError::validation("mix name must be non-empty"));
        }
        Viewport::new(self.viewport.width, self.viewport.height)?;
        if self.layers.is_empty() {
            return Err(MixscapeError::validation(format!(
                "mix '{}' has no layers",
                self.name
            )));
        }

        for layer in &self.layers {
            if layer.assets.iter().any(|a| a.trim().is_empty()) {
                return Err(MixscapeError::validation(format!(
                    "{} layer lists an empty asset path",
                    layer.kind.name()
                )));
            }
            if let Err(MixscapeError::Validation(msg)) = layer.resolved_params().validate() {
                return Err(MixscapeError::validation(format!(
                    "{} layer: {msg}",
                    layer.kind.name()
                )));
            }
        }
        Ok(())
    }

    /// Backdrop fill, if configured.
    pub fn gradient_fill(&self) -> Option<GradientFill> {
        self.gradient.map(GradientConfig::to_fill)
    }

    /// Decode every asset from disk relative to `root` and build layer descriptors.
    ///
    /// Unreadable files become failed handles and are filtered by the compositor.
    pub fn descriptors(&self, root: &Path) -> Vec<LayerDescriptor> {
        self.descriptors_with(|rel| load_image_file(root, rel))
    }

    /// Build layer descriptors, resolving each asset path through `load`.
    pub fn descriptors_with(&self, mut load: impl FnMut(&str) -> AssetHandle) -> Vec<LayerDescriptor> {
        self.layers
            .iter()
            .map(|layer| LayerDescriptor {
                kind: layer.kind,
                renderer: layer.renderer,
                params: layer.resolved_params(),
                assets: layer.assets.iter().map(|a| load(a.as_str())).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
