use {
    crate::{
        error::{InvalidConfigSnafu, Result},
        page_table::EntryFormat,
    },
    common::pub_fields_struct,
    snafu::ensure,
    std::path::PathBuf,
};

pub const DEFAULT_PAGE_SIZE: usize = 16;
pub const DEFAULT_FRAME_COUNT: usize = 4;
pub const DEFAULT_PROCESS_COUNT: usize = 4;
pub const DEFAULT_VIRTUAL_PAGES: usize = 4;
pub const DEFAULT_DISK_PATH: &str = "vmsim.disk";

pub_fields_struct! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Config {
        /// Bytes per page and per frame.
        page_size: usize,
        /// Number of physical frames.
        frame_count: usize,
        /// Number of processes, pids are `0..process_count`.
        process_count: usize,
        /// Number of virtual pages in every process's address space.
        virtual_pages: usize,
        /// Backing file of the disk store, truncated on start.
        disk_path: PathBuf,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frame_count: DEFAULT_FRAME_COUNT,
            process_count: DEFAULT_PROCESS_COUNT,
            virtual_pages: DEFAULT_VIRTUAL_PAGES,
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
        }
    }
}

impl Config {
    pub fn with_disk_path(disk_path: PathBuf) -> Self {
        Self {
            disk_path,
            ..Self::default()
        }
    }

    /// Size of a process's virtual address space in bytes.
    pub fn virtual_size(&self) -> usize {
        self.page_size * self.virtual_pages
    }

    pub fn memory_size(&self) -> usize {
        self.page_size * self.frame_count
    }

    pub fn entry_format(&self) -> EntryFormat {
        EntryFormat::new(self.virtual_pages, self.frame_count)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.page_size >= 2,
            InvalidConfigSnafu {
                details: format!("page size must be at least 2, got {}", self.page_size),
            }
        );
        ensure!(
            self.frame_count > 0 && self.process_count > 0 && self.virtual_pages > 0,
            InvalidConfigSnafu {
                details: "frame, process and virtual page counts must be non-zero".to_string(),
            }
        );

        let capacity = self.entry_format().capacity(self.page_size);
        ensure!(
            capacity >= self.virtual_pages,
            InvalidConfigSnafu {
                details: format!(
                    "a page table holds {} entries in a {} byte frame, {} virtual pages need one each",
                    capacity, self.page_size, self.virtual_pages
                ),
            }
        );

        Ok(())
    }
}
