use {
    crate::{
        error::{NoRoomSnafu, Result},
        FrameId, FREE_MARKER,
    },
    snafu::ensure,
    std::ops::Range,
};

/// Byte-addressable physical memory split into equally sized frames.
#[derive(Debug, Clone)]
pub struct PhysicalMemory {
    bytes: Vec<u8>,
    page_size: usize,
}

impl PhysicalMemory {
    pub fn new(frame_count: usize, page_size: usize) -> Self {
        Self {
            bytes: vec![FREE_MARKER; frame_count * page_size],
            page_size,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.bytes.len() / self.page_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn frame_range(&self, frame: FrameId) -> Range<usize> {
        let start = frame * self.page_size;
        start..start + self.page_size
    }

    pub fn read(&self, frame: FrameId, offset: usize) -> u8 {
        self.bytes[self.frame_range(frame)][offset]
    }

    /// Writes `data` at `offset` within `frame`, never crossing into the next frame.
    pub fn write(&mut self, frame: FrameId, offset: usize, data: &[u8]) -> Result<usize> {
        ensure!(
            offset + data.len() <= self.page_size,
            NoRoomSnafu {
                frame,
                offset,
                len: data.len(),
            }
        );

        let start = frame * self.page_size + offset;
        self.bytes[start..start + data.len()].copy_from_slice(data);

        Ok(data.len())
    }

    pub fn frame(&self, frame: FrameId) -> &[u8] {
        let range = self.frame_range(frame);
        &self.bytes[range]
    }

    pub fn frame_mut(&mut self, frame: FrameId) -> &mut [u8] {
        let range = self.frame_range(frame);
        &mut self.bytes[range]
    }

    /// Replaces the whole content of `frame`. `data` must be exactly one page long.
    pub fn load_frame(&mut self, frame: FrameId, data: &[u8]) {
        self.frame_mut(frame).copy_from_slice(data);
    }

    pub fn clear_frame(&mut self, frame: FrameId) {
        self.frame_mut(frame).fill(FREE_MARKER);
    }

    pub fn is_free_marker(byte: u8) -> bool {
        byte == FREE_MARKER
    }
}
