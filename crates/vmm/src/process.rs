use crate::{FrameId, SlotId, VirtualPage};

/// Where a process's page table currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageTableLocation {
    #[default]
    Unallocated,
    Resident(FrameId),
    Swapped(SlotId),
}

/// Bookkeeping of a mapped virtual page that is not kept inside the page table
/// frame itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    pub writable: bool,
    /// Disk slot holding the page while it is swapped out.
    pub swapped: Option<SlotId>,
}

impl PageEntry {
    pub fn is_resident(&self) -> bool {
        self.swapped.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub(crate) page_table: PageTableLocation,
    pub(crate) pages: Vec<Option<PageEntry>>,
}

impl Process {
    pub fn new(virtual_pages: usize) -> Self {
        Self {
            page_table: PageTableLocation::Unallocated,
            pages: vec![None; virtual_pages],
        }
    }

    pub fn page_table(&self) -> PageTableLocation {
        self.page_table
    }

    pub fn page(&self, v_page: VirtualPage) -> Option<PageEntry> {
        self.pages.get(v_page).copied().flatten()
    }

    pub(crate) fn page_mut(&mut self, v_page: VirtualPage) -> Option<&mut PageEntry> {
        self.pages.get_mut(v_page).and_then(Option::as_mut)
    }

    pub fn page_table_frame(&self) -> Option<FrameId> {
        match self.page_table {
            PageTableLocation::Resident(frame) => Some(frame),
            _ => None,
        }
    }

    /// Disk slots of this process, index 0 is reserved for the page table and
    /// index `v_page + 1` for each virtual page.
    pub fn disk_locations(&self) -> Vec<Option<SlotId>> {
        let page_table = match self.page_table {
            PageTableLocation::Swapped(slot) => Some(slot),
            _ => None,
        };

        std::iter::once(page_table)
            .chain(
                self.pages
                    .iter()
                    .map(|page| page.and_then(|page| page.swapped)),
            )
            .collect()
    }
}
