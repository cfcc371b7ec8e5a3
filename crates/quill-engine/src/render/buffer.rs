//! Fixed-capacity CPU storage behind the batch renderer.
//!
//! Neither type ever reallocates after construction. Callers check for room
//! and flush instead of growing.

use super::vertex::{DrawCall, Vertex};

/// Fixed-capacity vertex storage. Slots past `len` hold stale data.
#[derive(Debug)]
pub struct VertexArena {
    data: Box<[Vertex]>,
    len: usize,
}

impl VertexArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![Vertex::default(); capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    #[inline]
    pub fn has_room(&self, count: usize) -> bool {
        count <= self.remaining()
    }

    /// Writes `v` into the next slot. Returns `false` when full.
    #[inline]
    pub fn push(&mut self, v: Vertex) -> bool {
        match self.data.get_mut(self.len) {
            Some(slot) => {
                *slot = v;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Skips `count` slots (alignment padding). Returns `false` if that would
    /// run past the end.
    #[inline]
    pub fn skip(&mut self, count: usize) -> bool {
        if !self.has_room(count) {
            return false;
        }
        self.len += count;
        true
    }

    /// Removes and returns the last `count` vertices.
    pub fn split_off_tail(&mut self, count: usize) -> Vec<Vertex> {
        let count = count.min(self.len);
        let start = self.len - count;
        let tail = self.data[start..self.len].to_vec();
        self.len = start;
        tail
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vertex] {
        &self.data[..self.len]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Fixed-capacity list of draw calls. Always holds at least one entry: the
/// last one is the call currently receiving vertices.
#[derive(Debug)]
pub struct DrawCallTable {
    calls: Vec<DrawCall>,
    capacity: usize,
}

impl DrawCallTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut calls = Vec::with_capacity(capacity);
        calls.push(DrawCall::default());
        Self { calls, capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.calls.len() >= self.capacity
    }

    #[inline]
    pub fn current(&self) -> &DrawCall {
        // Never empty: `new` and `reset` both leave one entry.
        &self.calls[self.calls.len() - 1]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut DrawCall {
        let last = self.calls.len() - 1;
        &mut self.calls[last]
    }

    /// Appends `call` as the new current call. Returns `false` when full.
    #[inline]
    pub fn open(&mut self, call: DrawCall) -> bool {
        if self.is_full() {
            return false;
        }
        self.calls.push(call);
        true
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter()
    }

    /// Drops every call and starts over with `first` as the current call.
    pub fn reset(&mut self, first: DrawCall) {
        self.calls.clear();
        self.calls.push(first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::vertex::DrawMode;

    #[test]
    fn arena_refuses_past_capacity() {
        let mut arena = VertexArena::new(2);
        assert!(arena.push(Vertex::default()));
        assert!(arena.push(Vertex::default()));
        assert!(!arena.push(Vertex::default()));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn arena_skip_respects_capacity() {
        let mut arena = VertexArena::new(4);
        assert!(arena.skip(3));
        assert!(!arena.skip(2));
        assert_eq!(arena.remaining(), 1);
    }

    #[test]
    fn split_off_tail_returns_last_vertices() {
        let mut arena = VertexArena::new(8);
        for i in 0..5 {
            arena.push(Vertex { position: [i as f32, 0.0, 0.0], ..Vertex::default() });
        }
        let tail = arena.split_off_tail(2);
        assert_eq!(arena.len(), 3);
        assert_eq!(tail[0].position[0], 3.0);
        assert_eq!(tail[1].position[0], 4.0);
    }

    #[test]
    fn table_keeps_a_current_call() {
        let mut table = DrawCallTable::new(2);
        assert_eq!(table.len(), 1);
        assert!(table.open(DrawCall { mode: Some(DrawMode::Lines), ..DrawCall::default() }));
        assert!(table.is_full());
        assert!(!table.open(DrawCall::default()));
        table.reset(DrawCall::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table.current().mode, None);
    }
}
