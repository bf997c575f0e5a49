//! Scene item identifiers, keys and payloads.

use std::any::Any;

use vx_core::Bound;

use crate::gpu::Batch;
use crate::render_args::RenderArgs;

/// Stable identifier of a scene item.
///
/// `ItemId::INVALID` is reserved and never refers to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ItemId(pub(crate) u32);

impl ItemId {
    /// Reserved sentinel that never refers to an item.
    pub const INVALID: ItemId = ItemId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Render layer for sorting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemLayer {
    /// Default opaque geometry layer.
    #[default]
    Opaque,
    /// Transparent geometry (rendered after opaque).
    Transparent,
    /// Overlay elements (rendered on top).
    Overlay,
}

impl ItemLayer {
    /// All layers in render order.
    pub const ORDERED: [ItemLayer; 3] = [ItemLayer::Opaque, ItemLayer::Transparent, ItemLayer::Overlay];

    /// Returns the sort order for this layer (lower = rendered first).
    pub fn sort_order(&self) -> i32 {
        match self {
            ItemLayer::Opaque => 0,
            ItemLayer::Transparent => 100,
            ItemLayer::Overlay => 200,
        }
    }

    /// Returns true if this layer uses alpha blending.
    pub fn uses_blending(&self) -> bool {
        matches!(self, ItemLayer::Transparent | ItemLayer::Overlay)
    }
}

/// Classification of an item used by the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub layer: ItemLayer,
    pub visible: bool,
}

impl ItemKey {
    pub fn opaque_shape() -> Self {
        Self {
            layer: ItemLayer::Opaque,
            visible: true,
        }
    }

    pub fn transparent_shape() -> Self {
        Self {
            layer: ItemLayer::Transparent,
            visible: true,
        }
    }

    pub fn overlay() -> Self {
        Self {
            layer: ItemLayer::Overlay,
            visible: true,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Render data attached to a scene item.
pub trait Payload: Send + Sync + 'static {
    fn key(&self) -> ItemKey;

    fn bound(&self) -> Bound;

    /// Records the item's draw commands.
    fn render(&self, args: &RenderArgs, batch: &mut Batch);
}

/// Type-erased payload storage that still allows typed updates.
pub(crate) trait AnyPayload: Send + Sync {
    fn as_payload(&self) -> &dyn Payload;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<P: Payload> AnyPayload for P {
    fn as_payload(&self) -> &dyn Payload {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A live entry in the scene.
pub(crate) struct Item {
    pub(crate) payload: Box<dyn AnyPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_id() {
        assert!(!ItemId::INVALID.is_valid());
        assert!(ItemId(1).is_valid());
        assert_eq!(ItemId::default(), ItemId::INVALID);
    }

    #[test]
    fn test_layer_order() {
        let orders: Vec<i32> = ItemLayer::ORDERED.iter().map(|l| l.sort_order()).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
        assert!(!ItemLayer::Opaque.uses_blending());
    }
}
