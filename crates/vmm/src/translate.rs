use {
    crate::{
        error::{NotMappedSnafu, PageTableNotResidentSnafu, Result},
        memory::PhysicalMemory,
        page_table::{EntryFormat, PageTable},
        process::Process,
        FrameId, Pid, SlotId, VirtualPage,
    },
    log::debug,
    snafu::OptionExt,
};

pub fn find_page(v_addr: usize, page_size: usize) -> VirtualPage {
    v_addr / page_size
}

pub fn page_offset(v_addr: usize, page_size: usize) -> usize {
    v_addr % page_size
}

pub fn find_frame_base(frame: FrameId, page_size: usize) -> usize {
    frame * page_size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// Physical address of a resident page.
    Physical(usize),
    /// Disk slot of a swapped out page.
    Disk(SlotId),
}

/// Resolves `v_addr` through the page table of `pid`.
///
/// A swapped out page resolves to its disk slot without touching the page
/// table. A resident page is looked up in the serialized page table, which must
/// be resident itself.
pub fn translate(
    pid: Pid,
    process: &Process,
    memory: &PhysicalMemory,
    format: EntryFormat,
    v_addr: usize,
) -> Result<Translation> {
    let page_size = memory.page_size();
    let v_page = find_page(v_addr, page_size);

    let entry = process.page(v_page).context(NotMappedSnafu { pid, v_addr })?;
    if let Some(slot) = entry.swapped {
        return Ok(Translation::Disk(slot));
    }

    let pt_frame = process
        .page_table_frame()
        .context(PageTableNotResidentSnafu { pid })?;
    let frame = PageTable::new(memory.frame(pt_frame), format)
        .lookup(v_page)?
        .context(NotMappedSnafu { pid, v_addr })?;

    let address = find_frame_base(frame, page_size) + page_offset(v_addr, page_size);
    debug!(
        "translated virtual address {} of pid {} to physical address {}",
        v_addr, pid, address
    );

    Ok(Translation::Physical(address))
}
