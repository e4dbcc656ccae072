use {
    crate::SlotId,
    log::debug,
    snafu::{prelude::*, Backtrace},
    std::{
        fs::{File, OpenOptions},
        io::{self, Read, Seek, SeekFrom, Write},
        path::Path,
    },
};

/// Fills every byte of a free slot. Never produced by the memory encodings.
pub const DISK_FREE_MARKER: u8 = b'#';
/// Terminates every slot in the backing file.
pub const LINE_MARKER: u8 = b'\n';

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("disk IO error: {}", source))]
    Io {
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("slot {} out of range, the disk holds {} slots", slot, slot_count))]
    SlotOutOfRange {
        slot: SlotId,
        slot_count: usize,
        backtrace: Backtrace,
    },

    #[snafu(display("slot {} is free", slot))]
    SlotFree { slot: SlotId, backtrace: Backtrace },

    #[snafu(display("page of {} bytes does not match the slot size {}", len, page_size))]
    PageLength {
        len: usize,
        page_size: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Flat file of fixed-size page slots, one slot per line.
pub struct DiskStore {
    file: File,
    page_size: usize,
}

impl DiskStore {
    /// Opens the backing file at `path`, discarding whatever a previous run left there.
    pub fn create(path: &Path, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .context(IoSnafu)?;

        Ok(Self { file, page_size })
    }

    fn slot_len(&self) -> usize {
        self.page_size + 1
    }

    fn offset(&self, slot: SlotId) -> u64 {
        (slot * self.slot_len()) as u64
    }

    pub fn slot_count(&self) -> Result<usize> {
        let len = self.file.metadata().context(IoSnafu)?.len();
        Ok(len as usize / self.slot_len())
    }

    pub fn is_free(&mut self, slot: SlotId) -> Result<bool> {
        let slot_count = self.slot_count()?;
        ensure!(slot < slot_count, SlotOutOfRangeSnafu { slot, slot_count });

        let mut marker = [0u8; 1];
        let offset = self.offset(slot);
        self.file
            .seek(SeekFrom::Start(offset))
            .context(IoSnafu)?;
        self.file.read_exact(&mut marker).context(IoSnafu)?;

        Ok(marker[0] == DISK_FREE_MARKER)
    }

    fn first_free_slot(&mut self) -> Result<Option<SlotId>> {
        for slot in 0..self.slot_count()? {
            if self.is_free(slot)? {
                return Ok(Some(slot));
            }
        }

        Ok(None)
    }

    fn write_slot(&mut self, slot: SlotId, page: &[u8]) -> Result<()> {
        let mut line = Vec::with_capacity(self.slot_len());
        line.extend_from_slice(page);
        line.push(LINE_MARKER);

        let offset = self.offset(slot);
        self.file
            .seek(SeekFrom::Start(offset))
            .context(IoSnafu)?;
        self.file.write_all(&line).context(IoSnafu)
    }

    /// Stores `page` in the first free slot, appending a new slot when none is free.
    pub fn put(&mut self, page: &[u8]) -> Result<SlotId> {
        ensure!(
            page.len() == self.page_size,
            PageLengthSnafu {
                len: page.len(),
                page_size: self.page_size,
            }
        );

        let slot = match self.first_free_slot()? {
            Some(slot) => slot,
            None => self.slot_count()?,
        };
        self.write_slot(slot, page)?;

        debug!("wrote page to disk slot {}", slot);

        Ok(slot)
    }

    /// Reads the page held by `slot` and frees the slot. The bytes live only in
    /// the returned buffer afterwards.
    pub fn get(&mut self, slot: SlotId) -> Result<Vec<u8>> {
        ensure!(!self.is_free(slot)?, SlotFreeSnafu { slot });

        let mut page = vec![0u8; self.page_size];
        let offset = self.offset(slot);
        self.file
            .seek(SeekFrom::Start(offset))
            .context(IoSnafu)?;
        self.file.read_exact(&mut page).context(IoSnafu)?;

        self.write_slot(slot, &vec![DISK_FREE_MARKER; self.page_size])?;

        debug!("read page from disk slot {}, slot is free again", slot);

        Ok(page)
    }
}
