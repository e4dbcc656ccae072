use {
    crate::{
        config::Config,
        disk::DiskStore,
        error::{
            AddressOutOfRangeSnafu, DiskUnavailableSnafu, InternalSnafu, InvalidPidSnafu,
            NotAllocatedSnafu, NotMappedSnafu, NotStoredSnafu, Result, WriteDeniedSnafu,
            WriteOverflowSnafu,
        },
        frame::{FrameState, FrameTable},
        instruction::{Instruction, Op},
        memory::PhysicalMemory,
        page_table::{EntryFormat, PageTableMut},
        process::{PageEntry, PageTableLocation, Process},
        replacer::Replacer,
        translate::{self, find_page, page_offset, Translation},
        FrameId, Pid, Value, VirtualPage,
    },
    common::pub_fields_struct,
    log::{info, warn},
    snafu::{ensure, OptionExt, ResultExt},
    std::str,
};

/// Ends a stored value when the page has room left after its digits.
pub const VALUE_TERMINATOR: u8 = b'.';

pub_fields_struct! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    struct Stats {
        page_tables_created: usize,
        /// Frames taken away from their owner to satisfy an allocation.
        evictions: usize,
        swap_outs: usize,
        swap_ins: usize,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Mapped {
        v_page: VirtualPage,
        frame: FrameId,
    },
    /// The page was mapped before, only its permission changed.
    PermissionUpdated {
        v_page: VirtualPage,
        writable: bool,
    },
    Stored {
        value: Value,
        physical_address: usize,
    },
    Loaded {
        value: Value,
        physical_address: usize,
    },
}

pub struct Simulator<R: Replacer> {
    pub(crate) config: Config,
    pub(crate) format: EntryFormat,
    pub(crate) memory: PhysicalMemory,
    pub(crate) frames: FrameTable,
    pub(crate) processes: Vec<Process>,
    pub(crate) disk: DiskStore,
    pub(crate) replacer: R,
    pub(crate) stats: Stats,
}

impl<R: Replacer> Simulator<R> {
    pub fn new(config: Config, replacer: R) -> Result<Self> {
        config.validate()?;

        let disk =
            DiskStore::create(&config.disk_path, config.page_size).context(DiskUnavailableSnafu)?;

        Ok(Self {
            format: config.entry_format(),
            memory: PhysicalMemory::new(config.frame_count, config.page_size),
            frames: FrameTable::new(config.frame_count),
            processes: vec![Process::new(config.virtual_pages); config.process_count],
            disk,
            replacer,
            stats: Stats::default(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn frame_state(&self, frame: FrameId) -> FrameState {
        self.frames.state(frame)
    }

    pub fn frame_bytes(&self, frame: FrameId) -> &[u8] {
        self.memory.frame(frame)
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(pid)
    }

    fn check_address(&self, pid: Pid, v_addr: usize) -> Result<VirtualPage> {
        ensure!(pid < self.processes.len(), InvalidPidSnafu { pid });
        ensure!(
            v_addr < self.config.virtual_size(),
            AddressOutOfRangeSnafu { pid, v_addr }
        );

        Ok(find_page(v_addr, self.config.page_size))
    }

    pub fn execute(&mut self, instruction: &Instruction) -> Result<Outcome> {
        let &Instruction {
            pid,
            op,
            v_addr,
            value,
        } = instruction;

        match op {
            Op::Map => self.map(pid, v_addr, value != 0),
            Op::Store => self.store(pid, v_addr, value),
            Op::Load => self.load(pid, v_addr),
        }
    }

    /// Maps the virtual page holding `v_addr`. Mapping an already mapped page
    /// only updates its permission.
    pub fn map(&mut self, pid: Pid, v_addr: usize, writable: bool) -> Result<Outcome> {
        let v_page = self.check_address(pid, v_addr)?;

        if let Some(entry) = self.processes[pid].page_mut(v_page) {
            entry.writable = writable;
            warn!(
                "virtual page {} of pid {} is already mapped, set writable to {}",
                v_page, pid, writable
            );

            return Ok(Outcome::PermissionUpdated { v_page, writable });
        }

        let pt_frame = self.ensure_page_table(pid)?;
        let frame = self.allocate_frame(pid, &[pt_frame])?;

        PageTableMut::new(self.memory.frame_mut(pt_frame), self.format).append(v_page, frame)?;
        self.frames.assign(frame, FrameState::Data { pid, v_page });
        self.processes[pid].pages[v_page] = Some(PageEntry {
            writable,
            swapped: None,
        });
        self.replacer.record_access(pt_frame);
        self.replacer.record_access(frame);

        info!(
            "mapped virtual address {} (page {}) of pid {} into physical frame {}",
            v_addr, v_page, pid, frame
        );

        Ok(Outcome::Mapped { v_page, frame })
    }

    pub fn store(&mut self, pid: Pid, v_addr: usize, value: Value) -> Result<Outcome> {
        let v_page = self.check_address(pid, v_addr)?;

        let entry = self.processes[pid]
            .page(v_page)
            .context(NotAllocatedSnafu { pid, v_addr })?;
        ensure!(entry.writable, WriteDeniedSnafu { pid, v_addr });

        let page_size = self.config.page_size;
        let offset = page_offset(v_addr, page_size);
        let mut bytes = value.to_string().into_bytes();
        ensure!(
            offset + bytes.len() <= page_size,
            WriteOverflowSnafu { pid, v_addr, value }
        );
        if offset + bytes.len() < page_size {
            bytes.push(VALUE_TERMINATOR);
        }

        let (frame, physical_address) = self.resident_address(pid, v_addr)?;
        self.memory.write(frame, offset, &bytes)?;

        info!(
            "stored value {} at virtual address {} of pid {} (physical address {})",
            value, v_addr, pid, physical_address
        );

        Ok(Outcome::Stored {
            value,
            physical_address,
        })
    }

    pub fn load(&mut self, pid: Pid, v_addr: usize) -> Result<Outcome> {
        let v_page = self.check_address(pid, v_addr)?;
        self.processes[pid]
            .page(v_page)
            .context(NotMappedSnafu { pid, v_addr })?;

        let (frame, physical_address) = self.resident_address(pid, v_addr)?;
        let offset = page_offset(v_addr, self.config.page_size);
        let value = read_value(&self.memory.frame(frame)[offset..])
            .context(NotStoredSnafu { pid, v_addr })?;

        Ok(Outcome::Loaded {
            value,
            physical_address,
        })
    }

    /// Resolves `v_addr` without changing residency.
    pub fn translate(&self, pid: Pid, v_addr: usize) -> Result<Translation> {
        self.check_address(pid, v_addr)?;
        translate::translate(
            pid,
            &self.processes[pid],
            &self.memory,
            self.format,
            v_addr,
        )
    }

    /// Brings the page table and then the page of `v_addr` into memory and
    /// returns the frame and physical address it resolves to.
    fn resident_address(&mut self, pid: Pid, v_addr: usize) -> Result<(FrameId, usize)> {
        let v_page = find_page(v_addr, self.config.page_size);
        let pt_frame = self.ensure_page_table(pid)?;
        self.ensure_page(pid, v_page, pt_frame)?;

        match self.translate(pid, v_addr)? {
            Translation::Physical(address) => {
                let frame = address / self.config.page_size;
                self.replacer.record_access(pt_frame);
                self.replacer.record_access(frame);

                Ok((frame, address))
            }
            Translation::Disk(slot) => InternalSnafu {
                details: format!(
                    "virtual page {} of pid {} still on disk slot {} after swap in",
                    v_page, pid, slot
                ),
            }
            .fail(),
        }
    }

    pub(crate) fn ensure_page_table(&mut self, pid: Pid) -> Result<FrameId> {
        match self.processes[pid].page_table {
            PageTableLocation::Resident(frame) => Ok(frame),
            PageTableLocation::Unallocated => self.create_page_table(pid),
            PageTableLocation::Swapped(slot) => {
                let frame = self.allocate_frame(pid, &[])?;
                self.swap_in(slot, frame, FrameState::PageTable { pid })?;

                Ok(frame)
            }
        }
    }

    fn create_page_table(&mut self, pid: Pid) -> Result<FrameId> {
        let frame = self.allocate_frame(pid, &[])?;

        self.frames.assign(frame, FrameState::PageTable { pid });
        self.processes[pid].page_table = PageTableLocation::Resident(frame);
        self.replacer.record_access(frame);
        self.stats.page_tables_created += 1;

        info!("put page table for pid {} into physical frame {}", pid, frame);

        Ok(frame)
    }

    fn ensure_page(&mut self, pid: Pid, v_page: VirtualPage, pt_frame: FrameId) -> Result<()> {
        let swapped = self.processes[pid]
            .page(v_page)
            .and_then(|entry| entry.swapped);

        if let Some(slot) = swapped {
            let frame = self.allocate_frame(pid, &[pt_frame])?;
            self.swap_in(slot, frame, FrameState::Data { pid, v_page })?;
        }

        Ok(())
    }
}

/// Parses the decimal value starting at the first byte of `bytes`.
fn read_value(bytes: &[u8]) -> Option<Value> {
    let len = bytes
        .iter()
        .enumerate()
        .take_while(|&(i, &b)| b.is_ascii_digit() || (i == 0 && b == b'-'))
        .count();

    str::from_utf8(&bytes[..len]).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{replacer::RoundRobinReplacer, Error},
        tempfile::{tempdir, TempDir},
    };

    fn simulator() -> (Simulator<RoundRobinReplacer>, TempDir) {
        let dir = tempdir().unwrap();
        let config = Config::with_disk_path(dir.path().join("disk"));
        let replacer = RoundRobinReplacer::new(config.frame_count);

        (Simulator::new(config, replacer).unwrap(), dir)
    }

    #[test]
    fn read_value_stops_at_non_digits() {
        assert_eq!(read_value(b"42.***"), Some(42));
        assert_eq!(read_value(b"-7.**"), Some(-7));
        assert_eq!(read_value(b"13"), Some(13));
        assert_eq!(read_value(b"****"), None);
        assert_eq!(read_value(b"-.**"), None);
        assert_eq!(read_value(b".5"), None);
    }

    #[test]
    fn map_store_load() -> Result<()> {
        let (mut sim, _dir) = simulator();

        assert_eq!(
            sim.map(0, 0, true)?,
            Outcome::Mapped {
                v_page: 0,
                frame: 1
            }
        );
        assert_eq!(sim.frame_state(0), FrameState::PageTable { pid: 0 });
        assert_eq!(&sim.frame_bytes(0)[..4], b"0,1;");

        assert_eq!(
            sim.store(0, 0, 42)?,
            Outcome::Stored {
                value: 42,
                physical_address: 16
            }
        );
        assert_eq!(
            sim.load(0, 0)?,
            Outcome::Loaded {
                value: 42,
                physical_address: 16
            }
        );

        Ok(())
    }

    #[test]
    fn overwriting_shorter_value() -> Result<()> {
        let (mut sim, _dir) = simulator();
        sim.map(0, 20, true)?;

        sim.store(0, 20, 12345)?;
        sim.store(0, 20, 7)?;

        assert!(matches!(sim.load(0, 20)?, Outcome::Loaded { value: 7, .. }));

        Ok(())
    }

    #[test]
    fn value_filling_the_page_tail() -> Result<()> {
        let (mut sim, _dir) = simulator();
        sim.map(0, 0, true)?;

        sim.store(0, 13, 999)?;
        assert!(matches!(sim.load(0, 13)?, Outcome::Loaded { value: 999, .. }));

        assert!(matches!(
            sim.store(0, 14, 999),
            Err(Error::WriteOverflow {
                pid: 0,
                v_addr: 14,
                value: 999
            })
        ));

        Ok(())
    }

    #[test]
    fn remap_updates_permission_only() -> Result<()> {
        let (mut sim, _dir) = simulator();
        sim.map(1, 17, true)?;
        sim.store(1, 17, 5)?;

        assert_eq!(
            sim.map(1, 30, false)?,
            Outcome::PermissionUpdated {
                v_page: 1,
                writable: false
            }
        );
        assert!(matches!(
            sim.store(1, 17, 6),
            Err(Error::WriteDenied { pid: 1, v_addr: 17 })
        ));
        assert!(matches!(sim.load(1, 17)?, Outcome::Loaded { value: 5, .. }));
        assert_eq!(sim.stats().page_tables_created, 1);
        assert_eq!(sim.frames.iter().filter(|(_, s)| !s.is_free()).count(), 2);

        Ok(())
    }

    #[test]
    fn out_of_range_requests() {
        let (mut sim, _dir) = simulator();

        assert!(matches!(sim.map(4, 0, true), Err(Error::InvalidPid { pid: 4 })));
        assert!(matches!(
            sim.store(0, 64, 1),
            Err(Error::AddressOutOfRange { pid: 0, v_addr: 64 })
        ));
        assert!(matches!(
            sim.load(3, 100),
            Err(Error::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn execute_dispatches() -> Result<()> {
        let (mut sim, _dir) = simulator();

        let outcomes = ["0 map 0 0", "0 map 0 1", "0 store 3 -12", "0 load 3 0"]
            .iter()
            .map(|line| sim.execute(&line.parse().unwrap()))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(
            outcomes,
            vec![
                Outcome::Mapped {
                    v_page: 0,
                    frame: 1
                },
                Outcome::PermissionUpdated {
                    v_page: 0,
                    writable: true
                },
                Outcome::Stored {
                    value: -12,
                    physical_address: 19
                },
                Outcome::Loaded {
                    value: -12,
                    physical_address: 19
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn disk_in_missing_directory() {
        let dir = tempdir().unwrap();
        let config = Config::with_disk_path(dir.path().join("missing").join("disk"));

        assert!(matches!(
            Simulator::new(config, RoundRobinReplacer::new(4)),
            Err(Error::DiskUnavailable { .. })
        ));
    }
}
