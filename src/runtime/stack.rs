//! LIFO interrupt container
//!
//! Only the most recently pushed activity runs. When it completes it is
//! popped and the activity beneath it is stepped within the same tick, so
//! an override can be pushed on top of a running behaviour and fall back to
//! it once the override finishes.

use super::activity::{Activity, BoxedActivity};

/// Last-in-first-out activity stack
#[derive(Default)]
pub struct Stack {
    stack: Vec<BoxedActivity>,
}

impl Stack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an activity; it becomes the only one stepped until it completes
    pub fn push(&mut self, activity: BoxedActivity) -> &mut Self {
        self.stack.push(activity);
        self
    }

    /// Remove and return the top activity
    pub fn pop(&mut self) -> Option<BoxedActivity> {
        self.stack.pop()
    }

    /// The top activity, if any
    pub fn peek(&self) -> Option<&BoxedActivity> {
        self.stack.last()
    }

    /// Mutable access to the top activity
    pub fn peek_mut(&mut self) -> Option<&mut BoxedActivity> {
        self.stack.last_mut()
    }

    /// Number of activities on the stack
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Activity for Stack {
    /// Steps the top activity, popping and cascading while tops complete.
    ///
    /// The stack itself never completes.
    fn step(&mut self) -> bool {
        while let Some(top) = self.stack.last_mut() {
            if !top.step() {
                break;
            }
            self.stack.pop();
            tracing::trace!(depth = self.stack.len(), "stack popped completed activity");
        }
        false
    }
}

/// Build a stack, pushing `activities` in order (the last one ends up on top)
pub fn stack(activities: impl IntoIterator<Item = BoxedActivity>) -> Stack {
    let mut stack = Stack::new();
    for activity in activities {
        stack.push(activity);
    }
    stack
}
