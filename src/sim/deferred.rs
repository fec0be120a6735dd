//! Post-step command queue
//!
//! Anything that adds or removes bodies while the world is locked (during
//! the entity pass or a physics step) is queued here and executed, in
//! enqueue order, once the step has finished.

use std::collections::VecDeque;

use super::entity::EntityId;

/// A structural change waiting for the world to unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Remove the entity and its body
    Kill(EntityId),
    /// Fire the entity's weapon
    Fire(EntityId),
    /// Replace a scrap entity with a burst of allied tanks
    SpawnAllyWave(EntityId),
}

/// FIFO of deferred actions
#[derive(Debug, Default)]
pub struct DeferredQueue {
    actions: VecDeque<DeferredAction>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: DeferredAction) {
        self.actions.push_back(action);
    }

    pub fn pop(&mut self) -> Option<DeferredAction> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredAction> {
        self.actions.iter()
    }

    /// Number of queued actions matching a predicate
    pub fn count(&self, pred: impl Fn(&DeferredAction) -> bool) -> usize {
        self.actions.iter().filter(|&a| pred(a)).count()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = DeferredQueue::new();
        queue.push(DeferredAction::Fire(EntityId(1)));
        queue.push(DeferredAction::Kill(EntityId(2)));
        queue.push(DeferredAction::SpawnAllyWave(EntityId(3)));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(DeferredAction::Fire(EntityId(1))));
        assert_eq!(queue.pop(), Some(DeferredAction::Kill(EntityId(2))));
        assert_eq!(queue.pop(), Some(DeferredAction::SpawnAllyWave(EntityId(3))));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_count() {
        let mut queue = DeferredQueue::new();
        queue.push(DeferredAction::Kill(EntityId(1)));
        queue.push(DeferredAction::Kill(EntityId(1)));
        queue.push(DeferredAction::Fire(EntityId(1)));
        assert_eq!(queue.count(|a| matches!(a, DeferredAction::Kill(_))), 2);
    }
}
