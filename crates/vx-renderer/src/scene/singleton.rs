//! Scene items that must exist exactly once.

use super::{ItemId, Payload, Scene, Transaction};

/// Guard for an always-present scene item.
///
/// The owner keeps the item's ID; `ensure` allocates and installs the item
/// whenever that ID does not refer to a live payload, so a removed item is
/// recreated under a fresh ID.
#[derive(Debug, Default)]
pub struct SingletonItem {
    id: ItemId,
}

impl SingletonItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn exists_in(&self, scene: &Scene) -> bool {
        scene.is_valid_id(self.id)
    }

    /// Adds a `reset_item` edit to `transaction` if the item is not live,
    /// counting edits already in `transaction`. Returns true if the item was
    /// created by this call.
    pub fn ensure<P: Payload>(
        &mut self,
        scene: &Scene,
        transaction: &mut Transaction,
        make: impl FnOnce() -> P,
    ) -> bool {
        let exists = match transaction.liveness_of(self.id) {
            Some(live) => live,
            None => self.exists_in(scene),
        };
        if exists {
            return false;
        }
        self.id = scene.allocate_id();
        transaction.reset_item(self.id, make());
        true
    }
}
