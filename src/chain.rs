//! Collision chains: singly linked lists whose nodes live in a shared arena.
//!
//! Every bucket of a chained table owns a `Chain` (head key + length) and all
//! chains of a table share one `ChainArena`. Node keys are generational, so a
//! key to a deleted node never resolves to a node allocated later in the same
//! arena slot.

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Identifies one chain node within its arena.
    pub struct ChainKey;
}

#[derive(Clone, Debug)]
struct ChainNode<T> {
    value: T,
    next: Option<ChainKey>,
}

/// Node storage shared by all chains of a table.
#[derive(Clone, Debug)]
pub(crate) struct ChainArena<T> {
    nodes: SlotMap<ChainKey, ChainNode<T>>,
}

impl<T> ChainArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, key: ChainKey) -> Option<&T> {
        self.nodes.get(key).map(|n| &n.value)
    }

    pub(crate) fn get_mut(&mut self, key: ChainKey) -> Option<&mut T> {
        self.nodes.get_mut(key).map(|n| &mut n.value)
    }

    /// Successor of `key` in its chain.
    pub(crate) fn iterate_next(&self, key: ChainKey) -> Option<ChainKey> {
        self.nodes.get(key).and_then(|n| n.next)
    }

    /// Every node of every chain, in arena order.
    pub(crate) fn iter_mut(&mut self) -> ArenaIterMut<'_, T> {
        ArenaIterMut {
            it: self.nodes.iter_mut(),
        }
    }

    /// Moves every node value out, in arena order. Chains referring to this
    /// arena must be discarded afterwards.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.nodes.drain().map(|(_, n)| n.value)
    }
}

pub(crate) struct ArenaIterMut<'a, T> {
    it: slotmap::basic::IterMut<'a, ChainKey, ChainNode<T>>,
}

impl<'a, T> Iterator for ArenaIterMut<'a, T> {
    type Item = (ChainKey, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, n)| (k, &mut n.value))
    }
}

impl<T> Default for ChainArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Head of one bucket's overflow list.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Chain {
    head: Option<ChainKey>,
    len: usize,
}

impl Chain {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub(crate) fn front(&self) -> Option<ChainKey> {
        self.head
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn insert_front<T>(&mut self, arena: &mut ChainArena<T>, value: T) -> ChainKey {
        let key = arena.nodes.insert(ChainNode {
            value,
            next: self.head,
        });
        self.head = Some(key);
        self.len += 1;
        key
    }

    pub(crate) fn pop_front<T>(&mut self, arena: &mut ChainArena<T>) -> Option<T> {
        let head = self.head?;
        let node = arena.nodes.remove(head)?;
        self.head = node.next;
        self.len -= 1;
        Some(node.value)
    }

    /// Unlinks `key` from this chain and returns its value. Returns `None`
    /// if `key` is not a node of this chain.
    pub(crate) fn delete_node<T>(&mut self, arena: &mut ChainArena<T>, key: ChainKey) -> Option<T> {
        if self.head == Some(key) {
            return self.pop_front(arena);
        }
        let mut cursor = self.head?;
        loop {
            let next = arena.nodes.get(cursor)?.next?;
            if next == key {
                let removed = arena.nodes.remove(key)?;
                arena.nodes.get_mut(cursor)?.next = removed.next;
                self.len -= 1;
                return Some(removed.value);
            }
            cursor = next;
        }
    }

    /// Zero-based position of `key` within this chain.
    pub(crate) fn position_of<T>(&self, arena: &ChainArena<T>, key: ChainKey) -> Option<usize> {
        self.iter_keys(arena).position(|k| k == key)
    }

    pub(crate) fn iter_keys<'a, T>(&self, arena: &'a ChainArena<T>) -> ChainKeys<'a, T> {
        ChainKeys {
            arena,
            cursor: self.head,
        }
    }
}

/// Walks the node keys of one chain, front to back.
pub(crate) struct ChainKeys<'a, T> {
    arena: &'a ChainArena<T>,
    cursor: Option<ChainKey>,
}

impl<T> Iterator for ChainKeys<'_, T> {
    type Item = ChainKey;

    fn next(&mut self) -> Option<ChainKey> {
        let key = self.cursor?;
        self.cursor = self.arena.iterate_next(key);
        Some(key)
    }
}
