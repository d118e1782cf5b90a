//! Bounded stack of activation records addressed by a frame pointer.

use crate::error::ErrorKind;
use crate::frame::StackFrame;

/// Fixed-capacity array of frames.
///
/// Slots are reserved up front; `push` never reallocates. The frame pointer
/// is the index of the top frame, or `None` when the stack is empty.
#[derive(Debug)]
pub struct ControlStack<'a> {
    frames: Vec<StackFrame<'a>>,
    capacity: usize,
}

impl<'a> ControlStack<'a> {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the active frame.
    pub fn frame_pointer(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }

    /// Push a frame, failing if the stack is full.
    pub fn push(&mut self, frame: StackFrame<'a>) -> Result<(), ErrorKind> {
        if self.frames.len() >= self.capacity {
            return Err(ErrorKind::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<StackFrame<'a>> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&StackFrame<'a>> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut StackFrame<'a>> {
        self.frames.last_mut()
    }

    /// Drop every frame, returning the bottom one.
    pub fn unwind(&mut self) -> Option<StackFrame<'a>> {
        self.frames.drain(..).next()
    }

    /// The caller frame (mutable) and the active frame, if at least two
    /// frames are live.
    pub fn caller_and_top(&mut self) -> Option<(&mut StackFrame<'a>, &StackFrame<'a>)> {
        let fp = self.frame_pointer()?;
        if fp == 0 {
            return None;
        }
        let (below, above) = self.frames.split_at_mut(fp);
        Some((&mut below[fp - 1], &above[0]))
    }
}
