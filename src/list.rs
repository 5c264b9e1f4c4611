//! Recency-ordered list of cache objects.
//!
//! Nodes live in a slot arena and link to each other through [`SlotId`]s, so a
//! node can be unlinked in O(1) given the slot stored on its object. The front
//! of the list is the most recently used object, the back is the next victim.
//!
//! **Note**: This module is internal infrastructure for [`LruCache`](crate::LruCache).
//! It keeps each linked object's slot up to date; callers must only unlink an
//! object through the list that linked it.

use crate::object::{CacheObject, ObjectRef};
use std::ptr;

/// Stable handle to a node in a [`RecencyList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(pub(crate) usize);

#[derive(Debug)]
struct Node {
    obj: ObjectRef,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Doubly linked list over an arena of nodes.
#[derive(Debug, Default)]
pub(crate) struct RecencyList {
    slots: Vec<Option<Node>>,
    free_list: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl RecencyList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: SlotId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns `true` if the node at `id` holds exactly `obj`.
    pub(crate) fn holds(&self, id: SlotId, obj: &CacheObject) -> bool {
        self.node(id).is_some_and(|node| ptr::eq(&*node.obj, obj))
    }

    /// Links `obj` at the front and records the slot on the object.
    pub(crate) fn push_front(&mut self, obj: ObjectRef) -> SlotId {
        let node = Node {
            obj,
            prev: None,
            next: self.head,
        };
        let id = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                SlotId(idx)
            }
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            }
        };

        match self.head.and_then(|old| self.node_mut(old)) {
            Some(old_head) => old_head.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;

        if let Some(node) = self.node(id) {
            node.obj.set_slot(Some(id));
        }
        id
    }

    /// Detaches the node from its neighbours without freeing the slot.
    fn unlink(&mut self, id: SlotId) -> Option<(Option<SlotId>, Option<SlotId>)> {
        let (prev, next) = {
            let node = self.node(id)?;
            (node.prev, node.next)
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }
        Some((prev, next))
    }

    /// Unlinks the node and returns its object, clearing the object's slot.
    pub(crate) fn remove(&mut self, id: SlotId) -> Option<ObjectRef> {
        self.unlink(id)?;
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        node.obj.set_slot(None);
        Some(node.obj)
    }

    /// Moves an existing node to the front.
    pub(crate) fn move_to_front(&mut self, id: SlotId) -> bool {
        if self.head == Some(id) {
            return true;
        }
        if self.unlink(id).is_none() {
            return false;
        }
        let old_head = self.head;
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head.and_then(|h| self.node_mut(h)) {
            Some(head_node) => head_node.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        true
    }

    /// Returns the least recently used object.
    #[inline]
    pub(crate) fn back(&self) -> Option<&ObjectRef> {
        self.tail.and_then(|id| self.node(id)).map(|node| &node.obj)
    }

    /// Returns the most recently used object.
    #[inline]
    pub(crate) fn front(&self) -> Option<&ObjectRef> {
        self.head.and_then(|id| self.node(id)).map(|node| &node.obj)
    }

    /// Unlinks the least recently used object.
    pub(crate) fn pop_back(&mut self) -> Option<ObjectRef> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Iterates from the most to the least recently used object.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        for node in self.slots.drain(..).flatten() {
            node.obj.set_slot(None);
        }
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }
}

/// Iterator over a [`RecencyList`], front to back.
#[derive(Debug)]
pub(crate) struct Iter<'a> {
    list: &'a RecencyList,
    cursor: Option<SlotId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ObjectRef;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.obj)
    }
}
