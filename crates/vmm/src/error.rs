use {
    crate::{disk, FrameId, Pid, Value, VirtualPage},
    snafu::{prelude::*, Backtrace},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid configuration: {}", details))]
    InvalidConfig { details: String },

    #[snafu(display("pid {} is out of range", pid))]
    InvalidPid { pid: Pid },

    #[snafu(display("virtual address {} of pid {} is out of range", v_addr, pid))]
    AddressOutOfRange { pid: Pid, v_addr: usize },

    #[snafu(display("no free space for pid {}, memory is full", pid))]
    NoFreeSpace { pid: Pid },

    #[snafu(display("virtual address {} is not mapped for pid {}", v_addr, pid))]
    NotMapped { pid: Pid, v_addr: usize },

    #[snafu(display(
        "virtual address {} of pid {} has not been allocated",
        v_addr,
        pid
    ))]
    NotAllocated { pid: Pid, v_addr: usize },

    #[snafu(display("writes are not allowed to virtual address {} of pid {}", v_addr, pid))]
    WriteDenied { pid: Pid, v_addr: usize },

    #[snafu(display(
        "value {} does not fit before the page boundary at virtual address {} of pid {}",
        value,
        v_addr,
        pid
    ))]
    WriteOverflow {
        pid: Pid,
        v_addr: usize,
        value: Value,
    },

    #[snafu(display("no value stored at virtual address {} of pid {}", v_addr, pid))]
    NotStored { pid: Pid, v_addr: usize },

    #[snafu(display(
        "{} bytes at offset {} do not fit in frame {}",
        len,
        offset,
        frame
    ))]
    NoRoom {
        frame: FrameId,
        offset: usize,
        len: usize,
    },

    #[snafu(display("page table is full, it holds {} entries", capacity))]
    PageTableFull {
        capacity: usize,
        backtrace: Backtrace,
    },

    #[snafu(display("malformed page table entry at offset {}", offset))]
    CorruptPageTable { offset: usize, backtrace: Backtrace },

    #[snafu(display("page table has no entry for virtual page {}", v_page))]
    EntryNotFound {
        v_page: VirtualPage,
        backtrace: Backtrace,
    },

    #[snafu(display("page table of pid {} is not resident", pid))]
    PageTableNotResident { pid: Pid },

    #[snafu(display("disk is unavailable, source: {}", source))]
    DiskUnavailable {
        #[snafu(backtrace)]
        source: disk::Error,
    },

    #[snafu(display("internal error: {}", details))]
    Internal {
        details: String,
        backtrace: Backtrace,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
