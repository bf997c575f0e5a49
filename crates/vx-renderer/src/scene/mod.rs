//! Persistent scene graph and its transaction queue.
//!
//! Producers on any thread enqueue [`Transaction`]s; the render pass drains
//! the queue once per tick with [`Scene::process_transaction_queue`], so a
//! frame observes every transaction enqueued before its flush point, applied
//! in enqueue order.

mod item;
mod singleton;
mod transaction;

pub use item::{ItemId, ItemKey, ItemLayer, Payload};
pub use singleton::SingletonItem;
pub use transaction::Transaction;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};

use item::Item;
use transaction::Edit;

/// Scene containing all render items.
pub struct Scene {
    next_id: AtomicU32,
    items: RwLock<BTreeMap<ItemId, Item>>,
    pending: Mutex<Vec<Transaction>>,
    render_entities: AtomicBool,
}

impl Scene {
    /// Creates a new empty scene.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
            items: RwLock::new(BTreeMap::new()),
            pending: Mutex::new(Vec::new()),
            render_entities: AtomicBool::new(true),
        }
    }

    /// Allocates a fresh item ID. IDs are never reused.
    pub fn allocate_id(&self) -> ItemId {
        ItemId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns true if `id` was allocated by this scene, live or not.
    pub fn is_allocated(&self, id: ItemId) -> bool {
        id.is_valid() && id.0 < self.next_id.load(Ordering::Relaxed)
    }

    /// Returns true if `id` refers to a live payload once the queued
    /// transactions are applied.
    ///
    /// A removed item's ID is no longer valid.
    pub fn is_valid_id(&self, id: ItemId) -> bool {
        if !self.is_allocated(id) {
            return false;
        }
        // Lock order matches `process_transaction_queue`: items, then pending.
        let items = self.items.read();
        let mut live = items.contains_key(&id);
        for transaction in self.pending.lock().iter() {
            if let Some(state) = transaction.liveness_of(id) {
                live = state;
            }
        }
        live
    }

    /// Queues a transaction for the next flush. Empty transactions are ignored.
    pub fn enqueue_transaction(&self, transaction: Transaction) {
        if transaction.is_empty() {
            return;
        }
        self.pending.lock().push(transaction);
    }

    /// Number of transactions waiting for the next flush.
    pub fn pending_transactions(&self) -> usize {
        self.pending.lock().len()
    }

    /// Applies every queued transaction in enqueue order.
    ///
    /// Returns the number of transactions applied. Transactions enqueued
    /// while this runs are left for the next call.
    pub fn process_transaction_queue(&self) -> usize {
        let mut items = self.items.write();
        let queued = std::mem::take(&mut *self.pending.lock());
        if queued.is_empty() {
            return 0;
        }
        let count = queued.len();
        for transaction in queued {
            for edit in transaction.into_edits() {
                self.apply(&mut items, edit);
            }
        }
        tracing::trace!("Applied {} scene transactions", count);
        count
    }

    fn apply(&self, items: &mut BTreeMap<ItemId, Item>, edit: Edit) {
        match edit {
            Edit::Reset(id, payload) => {
                if !self.is_allocated(id) {
                    tracing::warn!("Ignoring reset of unallocated item {:?}", id);
                    return;
                }
                items.insert(id, Item { payload });
            }
            Edit::Update(id, update) => match items.get_mut(&id) {
                Some(item) => {
                    if !update(&mut *item.payload) {
                        tracing::warn!("Update of item {:?} had a mismatched payload type", id);
                    }
                }
                None => tracing::debug!("Ignoring update of missing item {:?}", id),
            },
            Edit::Remove(id) => {
                items.remove(&id);
            }
        }
    }

    /// Returns true if the scene contains a live item with the given ID.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.read().contains_key(&id)
    }

    /// Returns the number of live items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the scene has no live items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns the IDs of all live items in ascending order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.read().keys().copied().collect()
    }

    /// Visits every live item in ascending ID order.
    pub fn for_each_item(&self, mut f: impl FnMut(ItemId, &dyn Payload)) {
        for (id, item) in self.items.read().iter() {
            f(*id, item.payload.as_payload());
        }
    }

    /// Reads the payload of `id` if it is of type `P`.
    pub fn with_payload<P: Payload, R>(&self, id: ItemId, f: impl FnOnce(&P) -> R) -> Option<R> {
        let items = self.items.read();
        let payload = items.get(&id)?.payload.as_any().downcast_ref::<P>()?;
        Some(f(payload))
    }

    /// Whether entity items are currently rendered.
    pub fn should_render_entities(&self) -> bool {
        self.render_entities.load(Ordering::Relaxed)
    }

    pub fn set_render_entities(&self, enabled: bool) {
        self.render_entities.store(enabled, Ordering::Relaxed);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
