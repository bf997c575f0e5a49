//! Batched scene edits.

use std::fmt;

use super::item::{AnyPayload, ItemId, Payload};

type Updater = Box<dyn FnOnce(&mut dyn AnyPayload) -> bool + Send>;

pub(crate) enum Edit {
    Reset(ItemId, Box<dyn AnyPayload>),
    Update(ItemId, Updater),
    Remove(ItemId),
}

impl Edit {
    pub(crate) fn id(&self) -> ItemId {
        match self {
            Edit::Reset(id, _) | Edit::Update(id, _) | Edit::Remove(id) => *id,
        }
    }
}

/// An ordered batch of scene edits applied atomically.
#[derive(Default)]
pub struct Transaction {
    edits: Vec<Edit>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `payload` for `id`, replacing any existing payload.
    pub fn reset_item<P: Payload>(&mut self, id: ItemId, payload: P) {
        self.edits.push(Edit::Reset(id, Box::new(payload)));
    }

    /// Mutates the payload of `id` in place if it is of type `P`.
    pub fn update_item<P: Payload>(&mut self, id: ItemId, f: impl FnOnce(&mut P) + Send + 'static) {
        self.edits.push(Edit::Update(
            id,
            Box::new(move |payload: &mut dyn AnyPayload| {
                match payload.as_any_mut().downcast_mut::<P>() {
                    Some(p) => {
                        f(p);
                        true
                    }
                    None => false,
                }
            }),
        ));
    }

    pub fn remove_item(&mut self, id: ItemId) {
        self.edits.push(Edit::Remove(id));
    }

    /// Appends all edits of `other` after this transaction's edits.
    pub fn merge(&mut self, mut other: Transaction) {
        self.edits.append(&mut other.edits);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Whether `id` is live after this transaction's last reset or remove
    /// of it, or `None` if the transaction neither resets nor removes it.
    pub(crate) fn liveness_of(&self, id: ItemId) -> Option<bool> {
        self.edits.iter().rev().find_map(|edit| match edit {
            Edit::Reset(target, _) if *target == id => Some(true),
            Edit::Remove(target) if *target == id => Some(false),
            _ => None,
        })
    }

    pub(crate) fn into_edits(self) -> Vec<Edit> {
        self.edits
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ItemId> = self.edits.iter().map(Edit::id).collect();
        f.debug_struct("Transaction").field("edits", &ids).finish()
    }
}
