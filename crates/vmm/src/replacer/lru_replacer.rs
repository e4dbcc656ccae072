use {
    super::{is_candidate, Replacer, PASSES},
    crate::{frame::FrameTable, FrameId},
    lru::LruCache,
    std::num::NonZeroUsize,
};

pub struct LruReplacer(LruCache<FrameId, ()>);

impl LruReplacer {
    pub fn new(cap: NonZeroUsize) -> Self {
        Self(LruCache::new(cap))
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        self.0.put(frame_id, ());
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.0.pop(&frame_id);
    }

    fn victim(&mut self, frames: &FrameTable, pinned: &[FrameId]) -> Option<FrameId> {
        PASSES.into_iter().find_map(|pass| {
            self.0
                .iter()
                .rev()
                .map(|(&frame, _)| frame)
                .find(|&frame| is_candidate(frames, pinned, frame, pass))
        })
    }
}
