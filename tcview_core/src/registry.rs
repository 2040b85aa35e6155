//! Actor Registry - tag-indexed slots owning actor handles.
//!
//! Slot `k` belongs to tag `k`. The slot list only grows during a session;
//! retiring a tag empties its slot but keeps the index, so lookups by tag
//! stay O(1) and tag-to-index never shifts. Only [`ActorRegistry::clear`]
//! shrinks it, on an explicit scene reset.

use crate::error::ViewError;
use crate::model::{EntityClass, Tag};
use tcview_env::{ActorId, RenderGateway};

/// Per-class list mapping tags to owned actors.
#[derive(Debug, Clone)]
pub struct ActorRegistry {
    class: EntityClass,
    slots: Vec<Option<ActorId>>,
}

impl ActorRegistry {
    /// Creates an empty registry for one entity class.
    pub fn new(class: EntityClass) -> Self {
        Self {
            class,
            slots: Vec::new(),
        }
    }

    /// Entity class this registry holds.
    pub fn class(&self) -> EntityClass {
        self.class
    }

    /// Number of slots, occupied or empty.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the actor for `tag`, or `None` for an empty or unknown slot.
    pub fn get(&self, tag: Tag) -> Option<ActorId> {
        self.slots.get(tag as usize).copied().flatten()
    }

    /// Returns true if `tag` has a live actor.
    pub fn is_occupied(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    /// Iterates over occupied slots as `(tag, actor)`.
    pub fn occupied(&self) -> impl Iterator<Item = (Tag, ActorId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(k, slot)| slot.map(|id| (k as Tag, id)))
    }

    /// Sorted list of tags with live actors.
    pub fn occupied_tags(&self) -> Vec<Tag> {
        self.occupied().map(|(tag, _)| tag).collect()
    }

    /// Number of live actors.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Stores `id` in the slot for `tag`, gap-filling with empty slots.
    ///
    /// Returns the actor previously held by the slot, if any.
    pub(crate) fn place(&mut self, tag: Tag, id: ActorId) -> Option<ActorId> {
        let index = tag as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index].replace(id)
    }

    /// Empties the slot for `tag`, keeping its index.
    pub(crate) fn vacate(&mut self, tag: Tag) -> Option<ActorId> {
        self.slots.get_mut(tag as usize).and_then(Option::take)
    }

    /// Removes every actor from the gateway and drops all slots.
    ///
    /// Returns the number of actors removed.
    pub fn clear<G: RenderGateway + ?Sized>(&mut self, gateway: &mut G) -> Result<usize, ViewError> {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if let Some(id) = slot.take() {
                gateway.remove_actor(id)?;
                removed += 1;
            }
        }
        self.slots.clear();
        Ok(removed)
    }
}
