use crate::{
    foundation::core::{Affine, AssetId, ElementId, Rect, Vec2},
    layer::element::ElementNode,
    stage::bands::child_z,
};

/// Rendering substrate behind a layer container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Node in the GPU scene graph; children carry a transform and alpha.
    Scene,
    /// DOM-style overlay; children carry positioned style values.
    Overlay,
}

/// Where a container currently sits in the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// Built but never attached.
    Fresh,
    /// Attached at the given z value.
    Attached(i32),
    /// Removed from the stage; any further tick against it is stale.
    Detached,
}

/// Container a layer controller draws into.
///
/// Invariants (bounded population, replacement ordering) are enforced by the controller,
/// so any substrate that can insert, update and remove children works.
pub trait Surface: std::fmt::Debug {
    /// Substrate kind.
    fn kind(&self) -> SurfaceKind;
    /// Append a child on top of existing children.
    fn insert(&mut self, node: &ElementNode);
    /// Push new geometry/opacity for an existing child.
    fn update(&mut self, node: &ElementNode);
    /// Remove a child. Returns `false` when it was not present.
    fn remove(&mut self, id: ElementId) -> bool;
    /// Number of children.
    fn child_count(&self) -> usize;
    /// Children back to front.
    fn children(&self) -> Vec<ElementNode>;
    /// Attach at `z`.
    fn attach(&mut self, z: i32);
    /// Detach from the stage.
    fn detach(&mut self);
    /// Current attachment.
    fn attachment(&self) -> Attachment;
}

/// Scene-graph child: a unit quad scaled/translated by `transform`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteNode {
    /// Element id.
    pub id: ElementId,
    /// Texture asset.
    pub asset: AssetId,
    /// Unit square to viewport pixels.
    pub transform: Affine,
    /// Alpha multiplier.
    pub alpha: f32,
}

impl SpriteNode {
    fn from_node(node: &ElementNode) -> Self {
        let r = node.rect;
        Self {
            id: node.id,
            asset: node.asset.clone(),
            transform: Affine::translate(Vec2::new(r.x0, r.y0))
                * Affine::scale_non_uniform(r.width(), r.height()),
            alpha: node.opacity.clamp(0.0, 1.0) as f32,
        }
    }

    fn to_node(&self) -> ElementNode {
        ElementNode {
            id: self.id,
            asset: self.asset.clone(),
            rect: self.transform.transform_rect_bbox(Rect::new(0.0, 0.0, 1.0, 1.0)),
            opacity: f64::from(self.alpha),
        }
    }
}

/// GPU scene-graph container.
#[derive(Debug)]
pub struct SceneSurface {
    sprites: Vec<SpriteNode>,
    attachment: Attachment,
}

impl SceneSurface {
    /// Empty, unattached container.
    pub fn new() -> Self {
        Self {
            sprites: Vec::new(),
            attachment: Attachment::Fresh,
        }
    }

    /// Sprites back to front.
    pub fn sprites(&self) -> &[SpriteNode] {
        &self.sprites
    }
}

impl Default for SceneSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for SceneSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Scene
    }

    fn insert(&mut self, node: &ElementNode) {
        self.sprites.push(SpriteNode::from_node(node));
    }

    fn update(&mut self, node: &ElementNode) {
        if let Some(s) = self.sprites.iter_mut().find(|s| s.id == node.id) {
            *s = SpriteNode::from_node(node);
        }
    }

    fn remove(&mut self, id: ElementId) -> bool {
        let before = self.sprites.len();
        self.sprites.retain(|s| s.id != id);
        self.sprites.len() != before
    }

    fn child_count(&self) -> usize {
        self.sprites.len()
    }

    fn children(&self) -> Vec<ElementNode> {
        self.sprites.iter().map(SpriteNode::to_node).collect()
    }

    fn attach(&mut self, z: i32) {
        self.attachment = Attachment::Attached(z);
    }

    fn detach(&mut self) {
        self.attachment = Attachment::Detached;
    }

    fn attachment(&self) -> Attachment {
        self.attachment
    }
}

/// Inline style of an overlay child, as it would be written to the element.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    /// `left` in px.
    pub left: f64,
    /// `top` in px.
    pub top: f64,
    /// `width` in px.
    pub width: f64,
    /// `height` in px.
    pub height: f64,
    /// `opacity`.
    pub opacity: f64,
    /// `z-index`, always inside the container's band.
    pub z_index: i32,
}

/// Positioned overlay child.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayNode {
    /// Element id.
    pub id: ElementId,
    /// Image asset.
    pub asset: AssetId,
    /// Current style.
    pub style: OverlayStyle,
}

/// DOM-style overlay container animated by direct style mutation.
#[derive(Debug)]
pub struct OverlaySurface {
    nodes: Vec<OverlayNode>,
    attachment: Attachment,
}

impl OverlaySurface {
    /// Empty, unattached container.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            attachment: Attachment::Fresh,
        }
    }

    /// Children back to front.
    pub fn nodes(&self) -> &[OverlayNode] {
        &self.nodes
    }

    fn band_base(&self) -> i32 {
        match self.attachment {
            Attachment::Attached(z) => z,
            Attachment::Fresh | Attachment::Detached => 0,
        }
    }

    fn restack(&mut self) {
        let base = self.band_base();
        for (i, n) in self.nodes.iter_mut().enumerate() {
            n.style.z_index = child_z(base, i);
        }
    }

    fn style_for(node: &ElementNode, z_index: i32) -> OverlayStyle {
        OverlayStyle {
            left: node.rect.x0,
            top: node.rect.y0,
            width: node.rect.width(),
            height: node.rect.height(),
            opacity: node.opacity.clamp(0.0, 1.0),
            z_index,
        }
    }
}

impl Default for OverlaySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for OverlaySurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Overlay
    }

    fn insert(&mut self, node: &ElementNode) {
        let z = child_z(self.band_base(), self.nodes.len());
        self.nodes.push(OverlayNode {
            id: node.id,
            asset: node.asset.clone(),
            style: Self::style_for(node, z),
        });
    }

    fn update(&mut self, node: &ElementNode) {
        if let Some(n) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            n.style = Self::style_for(node, n.style.z_index);
        }
    }

    fn remove(&mut self, id: ElementId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        let removed = self.nodes.len() != before;
        if removed {
            self.restack();
        }
        removed
    }

    fn child_count(&self) -> usize {
        self.nodes.len()
    }

    fn children(&self) -> Vec<ElementNode> {
        self.nodes
            .iter()
            .map(|n| ElementNode {
                id: n.id,
                asset: n.asset.clone(),
                rect: Rect::new(
                    n.style.left,
                    n.style.top,
                    n.style.left + n.style.width,
                    n.style.top + n.style.height,
                ),
                opacity: n.style.opacity,
            })
            .collect()
    }

    fn attach(&mut self, z: i32) {
        self.attachment = Attachment::Attached(z);
        self.restack();
    }

    fn detach(&mut self) {
        self.attachment = Attachment::Detached;
    }

    fn attachment(&self) -> Attachment {
        self.attachment
    }
}

/// Fresh container for a surface kind.
pub fn new_surface(kind: SurfaceKind) -> Box<dyn Surface> {
    match kind {
        SurfaceKind::Scene => Box::new(SceneSurface::new()),
        SurfaceKind::Overlay => Box::new(OverlaySurface::new()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/surface.rs"]
mod tests;
