mod lru_replacer;
mod round_robin;

pub use self::{lru_replacer::LruReplacer, round_robin::RoundRobinReplacer};

use crate::{frame::FrameTable, FrameId};

/// Page replacement policy.
///
/// The simulator reports every frame it fills or touches and every frame it
/// releases; `victim` is only asked when no frame is free.
pub trait Replacer {
    fn record_access(&mut self, frame_id: FrameId);
    fn remove(&mut self, frame_id: FrameId);

    /// Picks an occupied frame outside `pinned`, preferring data pages over page tables.
    fn victim(&mut self, frames: &FrameTable, pinned: &[FrameId]) -> Option<FrameId>;
}

impl<R: Replacer + ?Sized> Replacer for Box<R> {
    fn record_access(&mut self, frame_id: FrameId) {
        (**self).record_access(frame_id)
    }

    fn remove(&mut self, frame_id: FrameId) {
        (**self).remove(frame_id)
    }

    fn victim(&mut self, frames: &FrameTable, pinned: &[FrameId]) -> Option<FrameId> {
        (**self).victim(frames, pinned)
    }
}

/// Eviction passes, data pages are tried before page tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    DataOnly,
    Any,
}

const PASSES: [Pass; 2] = [Pass::DataOnly, Pass::Any];

fn is_candidate(frames: &FrameTable, pinned: &[FrameId], frame: FrameId, pass: Pass) -> bool {
    let state = frames.state(frame);

    !state.is_free()
        && !pinned.contains(&frame)
        && match pass {
            Pass::DataOnly => state.is_data(),
            Pass::Any => true,
        }
}
