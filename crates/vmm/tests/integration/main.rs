use {
    rand::{prelude::*, rngs::StdRng},
    std::collections::{HashMap, HashSet},
    tempfile::{tempdir, TempDir},
    vmm::{
        Config, Error, FrameState, Outcome, Pid, Replacer, RoundRobinReplacer, Simulator,
        Translation, Value,
    },
};

fn simulator(dir: &TempDir) -> Simulator<RoundRobinReplacer> {
    let config = Config::with_disk_path(dir.path().join("disk"));
    let replacer = RoundRobinReplacer::new(config.frame_count);

    Simulator::new(config, replacer).unwrap()
}

#[test]
fn store_then_load() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    sim.map(0, 0, true).unwrap();
    sim.store(0, 0, 42).unwrap();

    assert!(matches!(
        sim.load(0, 0).unwrap(),
        Outcome::Loaded { value: 42, .. }
    ));

    dir.close().unwrap();
}

#[test]
fn fifth_page_evicts_once() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    // the page table takes the first frame, three pages fill the rest
    for v_addr in [0, 16, 32] {
        sim.map(0, v_addr, true).unwrap();
    }
    assert_eq!(sim.stats().evictions, 0);

    assert!(matches!(
        sim.map(0, 48, true).unwrap(),
        Outcome::Mapped { v_page: 3, .. }
    ));
    assert_eq!(sim.stats().evictions, 1);
    assert_eq!(sim.stats().swap_outs, 1);
}

#[test]
fn new_process_under_pressure_evicts_at_most_twice() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    for v_addr in [0, 16, 32] {
        sim.map(0, v_addr, true).unwrap();
    }

    sim.map(1, 0, true).unwrap();
    assert_eq!(sim.stats().evictions, 2);
    assert_eq!(sim.frame_state(0), FrameState::PageTable { pid: 0 });
}

#[test]
fn store_to_unmapped_page() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    sim.map(0, 0, true).unwrap();

    assert!(matches!(
        sim.store(0, 16, 1),
        Err(Error::NotAllocated { pid: 0, v_addr: 16 })
    ));
    assert!(matches!(
        sim.store(2, 0, 1),
        Err(Error::NotAllocated { pid: 2, v_addr: 0 })
    ));
}

#[test]
fn load_before_store() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    sim.map(0, 0, true).unwrap();

    assert!(matches!(
        sim.load(0, 5),
        Err(Error::NotStored { pid: 0, v_addr: 5 })
    ));
    assert!(matches!(
        sim.load(0, 40),
        Err(Error::NotMapped { pid: 0, v_addr: 40 })
    ));
}

#[test]
fn read_only_page_is_untouched() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    let Outcome::Mapped { frame, .. } = sim.map(3, 20, false).unwrap() else {
        panic!("page was mapped before");
    };
    let before = sim.frame_bytes(frame).to_vec();

    for v_addr in 16..32 {
        assert!(matches!(
            sim.store(3, v_addr, 9),
            Err(Error::WriteDenied { pid: 3, .. })
        ));
    }
    assert_eq!(sim.frame_bytes(frame), &before[..]);
}

#[test]
fn translation_stays_within_owned_frame() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);

    for (pid, v_addr) in [(0, 5), (1, 63), (0, 33)] {
        sim.map(pid, v_addr, true).unwrap();
        let v_page = v_addr / 16;

        for addr in v_page * 16..(v_page + 1) * 16 {
            let Translation::Physical(physical) = sim.translate(pid, addr).unwrap() else {
                panic!("page {} of pid {} is not resident", v_page, pid);
            };

            assert_eq!(physical % 16, addr % 16);
            assert_eq!(
                sim.frame_state(physical / 16),
                FrameState::Data { pid, v_page }
            );
        }
    }
}

/// Checks that frames, page tables and disk slots agree with each other.
fn check_consistency<R: Replacer>(sim: &Simulator<R>) {
    let config = sim.config().clone();
    let mut slots = HashSet::new();

    for pid in 0..config.process_count {
        let process = sim.process(pid).unwrap();

        for slot in process.disk_locations().into_iter().flatten() {
            assert!(slots.insert(slot), "disk slot {} referenced twice", slot);
        }

        if let Some(frame) = process.page_table_frame() {
            assert_eq!(sim.frame_state(frame), FrameState::PageTable { pid });
        }

        for v_page in 0..config.virtual_pages {
            let Some(entry) = process.page(v_page) else {
                continue;
            };

            match sim.translate(pid, v_page * config.page_size) {
                Ok(Translation::Physical(address)) => {
                    assert!(entry.is_resident());
                    assert_eq!(
                        sim.frame_state(address / config.page_size),
                        FrameState::Data { pid, v_page }
                    );
                }
                Ok(Translation::Disk(slot)) => assert_eq!(entry.swapped, Some(slot)),
                Err(Error::PageTableNotResident { .. }) => {
                    assert!(process.page_table_frame().is_none())
                }
                Err(err) => panic!("unexpected translation error {}", err),
            }
        }
    }
}

#[test]
fn random_workload_matches_model() {
    let dir = tempdir().unwrap();
    let mut sim = simulator(&dir);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut mapped: HashMap<(Pid, usize), bool> = HashMap::new();
    let mut stored: HashMap<(Pid, usize), Value> = HashMap::new();

    for _ in 0..2000 {
        let pid = rng.gen_range(0..4);
        let v_page = rng.gen_range(0..4);
        // two non-overlapping value cells per page
        let v_addr = v_page * 16 + rng.gen_range(0..2) * 8;
        let evictions = sim.stats().evictions;

        match rng.gen_range(0..3) {
            0 => {
                let writable = rng.gen_bool(0.8);
                let outcome = sim.map(pid, v_addr, writable).unwrap();

                match mapped.insert((pid, v_page), writable) {
                    Some(_) => assert!(matches!(outcome, Outcome::PermissionUpdated { .. })),
                    None => assert!(matches!(outcome, Outcome::Mapped { .. })),
                }
            }
            1 => {
                let value = rng.gen_range(-99_999..1_000_000);

                match (mapped.get(&(pid, v_page)), sim.store(pid, v_addr, value)) {
                    (None, result) => {
                        assert!(matches!(result, Err(Error::NotAllocated { .. })))
                    }
                    (Some(false), result) => {
                        assert!(matches!(result, Err(Error::WriteDenied { .. })))
                    }
                    (Some(true), result) => {
                        assert!(matches!(result, Ok(Outcome::Stored { .. })));
                        stored.insert((pid, v_addr), value);
                    }
                }
            }
            _ => match (
                mapped.contains_key(&(pid, v_page)),
                stored.get(&(pid, v_addr)),
                sim.load(pid, v_addr),
            ) {
                (false, _, result) => assert!(matches!(result, Err(Error::NotMapped { .. }))),
                (true, None, result) => assert!(matches!(result, Err(Error::NotStored { .. }))),
                (true, Some(&expected), result) => match result {
                    Ok(Outcome::Loaded { value, .. }) => assert_eq!(value, expected),
                    other => panic!("expected {}, got {:?}", expected, other),
                },
            },
        }

        assert!(sim.stats().evictions - evictions <= 2);
        check_consistency(&sim);
    }

    assert!(sim.stats().swap_ins > 0);
}
