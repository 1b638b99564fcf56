use tracing::{debug, info};

use crate::{
    assets::handle::{AssetHandle, AssetImage, filter_available},
    foundation::core::{AssetId, Rgba8Premul, Viewport},
    layer::{
        controller::{ElementController, LayerSetup, LayerStats},
        params::{LayerKind, LayerParams, RendererKind},
    },
    stage::{
        bands::{CHROME_Z, GRADIENT_Z, band_base},
        surface::{SurfaceKind, new_surface},
    },
};

/// Vertical two-stop gradient painted behind every layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradientFill {
    /// Colour at the top edge.
    pub top: Rgba8Premul,
    /// Colour at the bottom edge.
    pub bottom: Rgba8Premul,
}

/// Explicit context shared by the compositor and the controllers it builds.
#[derive(Clone, Debug)]
pub struct StageContext {
    /// Current viewport.
    pub viewport: Viewport,
    /// Seed for every layer RNG.
    pub seed: u64,
    /// Backdrop fill, if any.
    pub gradient: Option<GradientFill>,
}

/// One layer to build on the next render.
#[derive(Clone, Debug)]
pub struct LayerDescriptor {
    /// Visual category; fixes the z band.
    pub kind: LayerKind,
    /// Renderer override; `None` uses the kind's default.
    pub renderer: Option<RendererKind>,
    /// Tuning.
    pub params: LayerParams,
    /// Candidate assets.
    pub assets: Vec<AssetHandle>,
}

impl LayerDescriptor {
    /// Descriptor with built-in tuning and the default renderer for `kind`.
    pub fn new(kind: LayerKind, assets: Vec<AssetHandle>) -> Self {
        Self {
            kind,
            renderer: None,
            params: LayerParams::for_kind(kind),
            assets,
        }
    }

    /// Renderer this descriptor resolves to.
    pub fn resolved_renderer(&self) -> RendererKind {
        self.renderer.unwrap_or_else(|| self.kind.default_renderer())
    }
}

/// A live layer attached to the stage.
#[derive(Debug)]
pub struct LayerSlot {
    z: i32,
    controller: ElementController,
}

impl LayerSlot {
    /// Assigned z value.
    pub fn z(&self) -> i32 {
        self.z
    }

    /// The layer's controller.
    pub fn controller(&self) -> &ElementController {
        &self.controller
    }

    /// Mutable access for input side channels (dragging, decode completion).
    pub fn controller_mut(&mut self) -> &mut ElementController {
        &mut self.controller
    }
}

/// One entry of the resolved back-to-front stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StackEntry {
    /// Layer kind.
    pub kind: LayerKind,
    /// Renderer in use.
    pub renderer: RendererKind,
    /// Surface substrate.
    pub surface: SurfaceKind,
    /// Assigned z value.
    pub z: i32,
}

/// Places layer containers at fixed depths and owns their teardown.
#[derive(Debug)]
pub struct Compositor {
    ctx: StageContext,
    layers: Vec<LayerSlot>,
    generation: u64,
    next_layer_key: u32,
}

impl Compositor {
    /// Empty stage.
    pub fn new(ctx: StageContext) -> Self {
        Self {
            ctx,
            layers: Vec::new(),
            generation: 0,
            next_layer_key: 0,
        }
    }

    /// Context in use.
    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    /// Seed used by the next [`Compositor::render`]. Live layers keep their RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.ctx.seed = seed;
    }

    /// Replace the backdrop fill.
    pub fn set_gradient(&mut self, gradient: Option<GradientFill>) {
        self.ctx.gradient = gradient;
    }

    /// Attached layers in render order.
    pub fn layers(&self) -> &[LayerSlot] {
        &self.layers
    }

    /// Mutable attached layers.
    pub fn layers_mut(&mut self) -> &mut [LayerSlot] {
        &mut self.layers
    }

    /// First attached layer of `kind`.
    pub fn layer(&self, kind: LayerKind) -> Option<&LayerSlot> {
        self.layers.iter().find(|l| l.controller.kind() == kind)
    }

    /// Mutable first attached layer of `kind`.
    pub fn layer_mut(&mut self, kind: LayerKind) -> Option<&mut LayerSlot> {
        self.layers.iter_mut().find(|l| l.controller.kind() == kind)
    }

    /// Build, populate and attach one layer per descriptor.
    ///
    /// Any previous layers are torn down first. Layers whose container is still empty
    /// after population (no usable asset) are dropped without error. Returns how many
    /// layers were attached.
    #[tracing::instrument(skip(self, descriptors), fields(layers = descriptors.len()))]
    pub fn render(&mut self, descriptors: Vec<LayerDescriptor>) -> usize {
        self.teardown_all();
        self.generation = self.generation.wrapping_add(1);

        for (i, desc) in descriptors.into_iter().enumerate() {
            let renderer = desc.resolved_renderer();
            let surface_kind = match renderer {
                RendererKind::Ambient => SurfaceKind::Overlay,
                RendererKind::Sample | RendererKind::Static => SurfaceKind::Scene,
            };
            let setup = LayerSetup {
                slot: i as u32,
                layer_key: self.next_layer_key,
                kind: desc.kind,
                renderer,
                params: desc.params,
                viewport: self.ctx.viewport,
                seed: self.ctx.seed ^ self.generation.rotate_left(32),
            };
            self.next_layer_key = self.next_layer_key.wrapping_add(1);
            let mut controller = ElementController::new(
                setup,
                filter_available(desc.assets),
                new_surface(surface_kind),
            );
            controller.populate();

            if controller.surface().child_count() == 0 {
                debug!(layer = desc.kind.name(), "empty container discarded");
                controller.teardown();
                continue;
            }

            let z = band_base(desc.kind);
            controller.surface_mut().attach(z);
            self.layers.push(LayerSlot { z, controller });
        }

        // Stable: equal z keeps descriptor order.
        self.layers.sort_by_key(|l| l.z);
        info!(attached = self.layers.len(), generation = self.generation, "stage rendered");
        self.layers.len()
    }

    /// Tear down every layer and detach every container. Safe to call repeatedly.
    pub fn teardown_all(&mut self) -> usize {
        let n = self.layers.len();
        for mut slot in self.layers.drain(..) {
            slot.controller.teardown();
            slot.controller.surface_mut().detach();
        }
        if n > 0 {
            info!(layers = n, "stage torn down");
        }
        n
    }

    /// Per-frame callback: advance every layer by `dt` seconds.
    pub fn on_frame(&mut self, dt: f64) {
        for slot in &mut self.layers {
            slot.controller.on_frame(dt);
        }
    }

    /// Propagate a viewport change to every layer.
    pub fn resize(&mut self, viewport: Viewport) {
        self.ctx.viewport = viewport;
        for slot in &mut self.layers {
            slot.controller.set_viewport(viewport);
        }
    }

    /// Forward a finished decode to every layer that knows the asset.
    pub fn resolve_asset(&mut self, asset: &AssetId, image: AssetImage) {
        for slot in &mut self.layers {
            slot.controller.resolve_asset(asset, image.clone());
        }
    }

    /// Resolved back-to-front stack of attached layers.
    pub fn stacking(&self) -> Vec<StackEntry> {
        self.layers
            .iter()
            .map(|l| StackEntry {
                kind: l.controller.kind(),
                renderer: l.controller.renderer(),
                surface: l.controller.surface().kind(),
                z: l.z,
            })
            .collect()
    }

    /// z of the gradient backdrop.
    pub fn gradient_z(&self) -> i32 {
        GRADIENT_Z
    }

    /// z reserved for UI chrome; always above every layer.
    pub fn chrome_z(&self) -> i32 {
        CHROME_Z
    }

    /// Per-layer counters in stack order.
    pub fn stats(&self) -> Vec<(LayerKind, LayerStats)> {
        self.layers
            .iter()
            .map(|l| (l.controller.kind(), l.controller.stats()))
            .collect()
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.teardown_all();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/compositor.rs"]
mod tests;
