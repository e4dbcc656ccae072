use {
    crate::{
        error::{
            DiskUnavailableSnafu, InternalSnafu, InvalidPidSnafu, NoFreeSpaceSnafu,
            PageTableNotResidentSnafu, Result,
        },
        frame::FrameState,
        page_table::PageTableMut,
        process::PageTableLocation,
        replacer::Replacer,
        simulator::Simulator,
        FrameId, Pid, SlotId,
    },
    log::info,
    snafu::{ensure, OptionExt, ResultExt},
};

impl<R: Replacer> Simulator<R> {
    /// Returns a free frame, evicting exactly one frame when memory is full.
    pub(crate) fn allocate_frame(&mut self, pid: Pid, pinned: &[FrameId]) -> Result<FrameId> {
        if let Some(frame) = self.frames.first_free() {
            return Ok(frame);
        }

        let victim = self.select_victim(pid, pinned)?;
        self.swap_out(victim)?;
        self.stats.evictions += 1;

        Ok(victim)
    }

    /// Picks the frame the policy would evict next on behalf of `pid`, without
    /// swapping it out. The policy state advances as for a real eviction. The
    /// frame holding the page table of `pid` is never chosen.
    pub fn evict(&mut self, pid: Pid) -> Result<FrameId> {
        ensure!(pid < self.processes.len(), InvalidPidSnafu { pid });
        self.select_victim(pid, &[])
    }

    fn select_victim(&mut self, pid: Pid, pinned: &[FrameId]) -> Result<FrameId> {
        let mut pinned = pinned.to_vec();
        pinned.extend(self.processes[pid].page_table_frame());

        let victim = self
            .replacer
            .victim(&self.frames, &pinned)
            .context(NoFreeSpaceSnafu { pid })?;
        debug_assert!(!pinned.contains(&victim));

        info!(
            "evicting physical frame {} ({:?}) for pid {}",
            victim,
            self.frames.state(victim),
            pid
        );

        Ok(victim)
    }

    /// Moves the content of `victim` to a new disk slot, points its owner at
    /// the slot and frees the frame.
    pub fn swap_out(&mut self, victim: FrameId) -> Result<SlotId> {
        let owner = self.frames.state(victim);
        ensure!(
            !owner.is_free(),
            InternalSnafu {
                details: format!("frame {} is free, nothing to swap out", victim),
            }
        );

        let slot = self
            .disk
            .put(self.memory.frame(victim))
            .context(DiskUnavailableSnafu)?;

        match owner {
            FrameState::PageTable { pid } => {
                self.processes[pid].page_table = PageTableLocation::Swapped(slot);
            }
            FrameState::Data { pid, v_page } => {
                let entry = self.processes[pid]
                    .page_mut(v_page)
                    .context(InternalSnafu {
                        details: format!("frame {} holds unmapped page {}", victim, v_page),
                    })?;
                entry.swapped = Some(slot);
            }
            FrameState::Free => unreachable!(),
        }

        self.memory.clear_frame(victim);
        self.frames.release(victim);
        self.replacer.remove(victim);
        self.stats.swap_outs += 1;

        info!(
            "swapped out physical frame {} ({:?}) to disk slot {}",
            victim, owner, slot
        );

        Ok(slot)
    }

    /// Loads the page in `slot` into the free frame `target` on behalf of `owner`.
    /// The owning process's page table must be resident for a data page.
    pub(crate) fn swap_in(&mut self, slot: SlotId, target: FrameId, owner: FrameState) -> Result<()> {
        let pt_frame = match owner {
            FrameState::Data { pid, .. } => Some(
                self.processes[pid]
                    .page_table_frame()
                    .context(PageTableNotResidentSnafu { pid })?,
            ),
            FrameState::PageTable { .. } => None,
            FrameState::Free => {
                return InternalSnafu {
                    details: format!("cannot swap disk slot {} in without an owner", slot),
                }
                .fail()
            }
        };

        let page = self.disk.get(slot).context(DiskUnavailableSnafu)?;
        self.memory.load_frame(target, &page);
        self.frames.assign(target, owner);

        match (owner, pt_frame) {
            (FrameState::Data { pid, v_page }, Some(pt_frame)) => {
                if let Some(entry) = self.processes[pid].page_mut(v_page) {
                    entry.swapped = None;
                }
                PageTableMut::new(self.memory.frame_mut(pt_frame), self.format)
                    .remap(v_page, target)?;
            }
            (FrameState::PageTable { pid }, _) => {
                self.processes[pid].page_table = PageTableLocation::Resident(target);
            }
            _ => unreachable!(),
        }

        self.replacer.record_access(target);
        self.stats.swap_ins += 1;

        info!(
            "swapped disk slot {} into physical frame {} ({:?})",
            slot, target, owner
        );

        Ok(())
    }
}
