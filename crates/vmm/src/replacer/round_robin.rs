use {
    super::{is_candidate, Replacer, PASSES},
    crate::{frame::FrameTable, FrameId},
};

/// Cycles over frame indices with a cursor that moves on every call.
#[derive(Debug, Clone)]
pub struct RoundRobinReplacer {
    cursor: FrameId,
    frame_count: usize,
}

impl RoundRobinReplacer {
    pub fn new(frame_count: usize) -> Self {
        Self {
            cursor: 0,
            frame_count,
        }
    }

    pub fn cursor(&self) -> FrameId {
        self.cursor
    }
}

impl Replacer for RoundRobinReplacer {
    fn record_access(&mut self, _frame_id: FrameId) {}

    fn remove(&mut self, _frame_id: FrameId) {}

    fn victim(&mut self, frames: &FrameTable, pinned: &[FrameId]) -> Option<FrameId> {
        if self.frame_count == 0 {
            return None;
        }

        let start = self.cursor;
        self.cursor = (start + 1) % self.frame_count;

        for pass in PASSES {
            let found = (0..self.frame_count)
                .map(|step| (start + step) % self.frame_count)
                .find(|&frame| is_candidate(frames, pinned, frame, pass));

            if let Some(frame) = found {
                self.cursor = (frame + 1) % self.frame_count;
                return Some(frame);
            }
        }

        None
    }
}
