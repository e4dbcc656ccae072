use {
    crate::{
        error::{CorruptPageTableSnafu, EntryNotFoundSnafu, PageTableFullSnafu, Result},
        memory::PhysicalMemory,
        FrameId, VirtualPage,
    },
    snafu::{ensure, OptionExt},
    std::str,
};

pub const FIELD_SEPARATOR: u8 = b',';
pub const ENTRY_TERMINATOR: u8 = b';';

/// Layout of one serialized entry: `<v_page>,<p_page>;`, both fields zero padded
/// to the same width so that an entry can be remapped in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFormat {
    width: usize,
}

impl EntryFormat {
    pub fn new(virtual_pages: usize, frame_count: usize) -> Self {
        let largest = virtual_pages.max(frame_count).saturating_sub(1);
        Self {
            width: largest.to_string().len(),
        }
    }

    pub fn entry_len(&self) -> usize {
        2 * self.width + 2
    }

    /// Number of entries that fit in a frame of `page_size` bytes.
    pub fn capacity(&self, page_size: usize) -> usize {
        page_size / self.entry_len()
    }

    fn encode(&self, v_page: VirtualPage, frame: FrameId) -> Vec<u8> {
        format!(
            "{:0w$}{}{:0w$}{}",
            v_page,
            FIELD_SEPARATOR as char,
            frame,
            ENTRY_TERMINATOR as char,
            w = self.width
        )
        .into_bytes()
    }

    fn decode(&self, entry: &[u8], offset: usize) -> Result<(VirtualPage, FrameId)> {
        let (v_field, rest) = entry.split_at(self.width);
        let (separator, rest) = rest.split_at(1);
        let (p_field, terminator) = rest.split_at(self.width);

        ensure!(
            separator == [FIELD_SEPARATOR] && terminator == [ENTRY_TERMINATOR],
            CorruptPageTableSnafu { offset }
        );

        let field = |bytes: &[u8]| {
            str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .context(CorruptPageTableSnafu { offset })
        };

        Ok((field(v_field)?, field(p_field)?))
    }
}

/// Read-only view over a frame that holds a process's page table.
#[derive(Debug)]
pub struct PageTable<'a> {
    bytes: &'a [u8],
    format: EntryFormat,
}

impl<'a> PageTable<'a> {
    pub fn new(bytes: &'a [u8], format: EntryFormat) -> Self {
        Self { bytes, format }
    }

    fn slots(&self) -> impl Iterator<Item = (usize, &'a [u8])> {
        let bytes: &'a [u8] = self.bytes;
        let len = self.format.entry_len();
        bytes
            .chunks_exact(len)
            .enumerate()
            .map(move |(i, chunk)| (i * len, chunk))
    }

    /// Decodes every entry in the order it was written.
    pub fn entries(&self) -> Result<Vec<(VirtualPage, FrameId)>> {
        self.slots()
            .take_while(|(_, chunk)| !PhysicalMemory::is_free_marker(chunk[0]))
            .map(|(offset, chunk)| self.format.decode(chunk, offset))
            .collect()
    }

    pub fn lookup(&self, v_page: VirtualPage) -> Result<Option<FrameId>> {
        Ok(self
            .entries()?
            .into_iter()
            .find_map(|(v, frame)| (v == v_page).then_some(frame)))
    }

    pub fn len(&self) -> usize {
        self.slots()
            .take_while(|(_, chunk)| !PhysicalMemory::is_free_marker(chunk[0]))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.format.capacity(self.bytes.len())
    }
}

#[derive(Debug)]
pub struct PageTableMut<'a> {
    bytes: &'a mut [u8],
    format: EntryFormat,
}

impl<'a> PageTableMut<'a> {
    pub fn new(bytes: &'a mut [u8], format: EntryFormat) -> Self {
        Self { bytes, format }
    }

    pub fn view(&self) -> PageTable<'_> {
        PageTable::new(self.bytes, self.format)
    }

    /// Serializes a new entry into the first free entry region.
    pub fn append(&mut self, v_page: VirtualPage, frame: FrameId) -> Result<()> {
        let table = self.view();
        ensure!(
            !table.is_full(),
            PageTableFullSnafu {
                capacity: self.format.capacity(self.bytes.len()),
            }
        );

        let offset = table.len() * self.format.entry_len();
        let entry = self.format.encode(v_page, frame);
        self.bytes[offset..offset + entry.len()].copy_from_slice(&entry);

        Ok(())
    }

    /// Rewrites the frame field of the entry for `v_page`, the virtual field stays as is.
    pub fn remap(&mut self, v_page: VirtualPage, frame: FrameId) -> Result<()> {
        let index = self
            .view()
            .entries()?
            .iter()
            .position(|&(v, _)| v == v_page)
            .context(EntryNotFoundSnafu { v_page })?;

        let entry = self.format.encode(v_page, frame);
        let field_start = self.format.width + 1;
        let offset = index * self.format.entry_len();
        self.bytes[offset + field_start..offset + entry.len()]
            .copy_from_slice(&entry[field_start..]);

        Ok(())
    }
}
