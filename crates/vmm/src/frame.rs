use crate::{FrameId, Pid, VirtualPage};

/// Owner of a physical frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameState {
    Free,
    PageTable { pid: Pid },
    Data { pid: Pid, v_page: VirtualPage },
}

impl FrameState {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    pub fn pid(&self) -> Option<Pid> {
        match *self {
            Self::Free => None,
            Self::PageTable { pid } | Self::Data { pid, .. } => Some(pid),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameTable {
    states: Vec<FrameState>,
}

impl FrameTable {
    pub fn new(frame_count: usize) -> Self {
        Self {
            states: vec![FrameState::Free; frame_count],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, frame: FrameId) -> FrameState {
        self.states[frame]
    }

    pub fn first_free(&self) -> Option<FrameId> {
        self.states.iter().position(FrameState::is_free)
    }

    pub(crate) fn assign(&mut self, frame: FrameId, state: FrameState) {
        debug_assert!(self.states[frame].is_free(), "frame {} is occupied", frame);
        self.states[frame] = state;
    }

    pub(crate) fn release(&mut self, frame: FrameId) {
        self.states[frame] = FrameState::Free;
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameId, FrameState)> + '_ {
        self.states.iter().copied().enumerate()
    }
}
