mod logging;

use {
    clap::{arg, value_parser, ArgMatches, Command},
    log::debug,
    snafu::prelude::*,
    std::{
        env,
        fs::File,
        io::{self, BufRead, BufReader},
        num::NonZeroUsize,
        path::PathBuf,
        process,
    },
    vmm::{
        config::DEFAULT_DISK_PATH, instruction::ParseError, Config, FrameState, Instruction,
        LruReplacer, Outcome, Replacer, RoundRobinReplacer, Simulator,
    },
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to set up logging: {}", source))]
    Logging { source: log::SetLoggerError },

    #[snafu(display("failed to start the simulator: {}", source))]
    StartSimulator {
        #[snafu(backtrace)]
        source: vmm::Error,
    },

    #[snafu(display("failed to open instruction file {}: {}", path.display(), source))]
    OpenInput { path: PathBuf, source: io::Error },

    #[snafu(display("failed to read instructions: {}", source))]
    ReadInput { source: io::Error },

    #[snafu(display("invalid instruction `{}`: {}", text, source))]
    ParseInstruction {
        text: String,
        #[snafu(backtrace)]
        source: ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

const VMSIM_DISK: &str = "VMSIM_DISK";

const POLICY_ROUND_ROBIN: &str = "round-robin";
const POLICY_LRU: &str = "lru";

fn cli() -> Command {
    let pkg_name = env!("CARGO_PKG_NAME");

    Command::new(pkg_name)
        .bin_name(pkg_name)
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(arg!(-f --file <PATH> "read instructions from a file instead of stdin").required(false))
        .arg(
            arg!(--frames <N> "number of physical frames")
                .required(false)
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            arg!(--"page-size" <BYTES> "bytes per page and per frame")
                .required(false)
                .value_parser(value_parser!(usize))
                .default_value("16"),
        )
        .arg(
            arg!(--processes <N> "number of processes")
                .required(false)
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            arg!(--pages <N> "virtual pages per process")
                .required(false)
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(arg!(--disk <PATH> "backing file of the swap disk").required(false))
        .arg(
            arg!(--policy <POLICY> "page replacement policy")
                .required(false)
                .value_parser([POLICY_ROUND_ROBIN, POLICY_LRU])
                .default_value(POLICY_ROUND_ROBIN),
        )
        .arg(arg!(--dump "print every physical frame after the last instruction"))
        .arg(arg!(-v --verbose ... "log more, repeat for more detail"))
        .arg(
            arg!([INSTRUCTION] ... "a single instruction: pid op vaddr value")
                .allow_negative_numbers(true),
        )
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{}", err);
        process::exit(2);
    }
}

fn try_main() -> Result<()> {
    let matches = cli().get_matches();

    logging::init(logging::level_for(matches.get_count("verbose"))).context(LoggingSnafu)?;

    let config = config_from(&matches);
    let replacer = replacer_from(&matches, config.frame_count);
    let mut sim = Simulator::new(config, replacer).context(StartSimulatorSnafu)?;

    match matches.get_many::<String>("INSTRUCTION") {
        Some(fields) => {
            let text = fields.cloned().collect::<Vec<_>>().join(" ");
            let instruction = text
                .parse::<Instruction>()
                .context(ParseInstructionSnafu { text })?;
            println!("{}", execute(&mut sim, &instruction));
        }
        None => {
            let input: Box<dyn BufRead> = match matches.get_one::<String>("file") {
                Some(path) => Box::new(BufReader::new(
                    File::open(path).context(OpenInputSnafu { path })?,
                )),
                None => Box::new(io::stdin().lock()),
            };
            run(&mut sim, input)?;
        }
    }

    if matches.get_flag("dump") {
        dump(&sim);
    }

    Ok(())
}

fn config_from(matches: &ArgMatches) -> Config {
    let count = |id: &str| matches.get_one::<usize>(id).copied().unwrap_or_default();

    let disk_path = match matches.get_one::<String>("disk") {
        Some(path) => path.into(),
        None => env::var(VMSIM_DISK).unwrap_or_else(|_| DEFAULT_DISK_PATH.to_string()),
    };

    Config {
        page_size: count("page-size"),
        frame_count: count("frames"),
        process_count: count("processes"),
        virtual_pages: count("pages"),
        disk_path: PathBuf::from(disk_path),
    }
}

fn replacer_from(matches: &ArgMatches, frame_count: usize) -> Box<dyn Replacer> {
    match matches.get_one::<String>("policy").map(String::as_str) {
        Some(POLICY_LRU) => Box::new(LruReplacer::new(
            NonZeroUsize::new(frame_count).unwrap_or(NonZeroUsize::MIN),
        )),
        _ => Box::new(RoundRobinReplacer::new(frame_count)),
    }
}

/// Executes every instruction line of `input`, reporting failures and moving on.
fn run<R: Replacer>(sim: &mut Simulator<R>, input: impl BufRead) -> Result<()> {
    for line in input.lines() {
        let line = line.context(ReadInputSnafu)?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        match text.parse::<Instruction>() {
            Ok(instruction) => println!("{}", execute(sim, &instruction)),
            Err(err) => println!("ERROR: invalid instruction `{}`: {}", text, err),
        }
    }

    Ok(())
}

fn execute<R: Replacer>(sim: &mut Simulator<R>, instruction: &Instruction) -> String {
    debug!("parsed command: {}", instruction);

    match sim.execute(instruction) {
        Ok(outcome) => render(instruction, &outcome),
        Err(err) => format!("ERROR: {}", err),
    }
}

fn render(instruction: &Instruction, outcome: &Outcome) -> String {
    let v_addr = instruction.v_addr;

    match *outcome {
        Outcome::Mapped { v_page, frame } => format!(
            "Mapped virtual address {} (page {}) into physical frame {}",
            v_addr, v_page, frame
        ),
        Outcome::PermissionUpdated { v_page, writable } => format!(
            "Virtual page {} is already mapped, updated it to {}",
            v_page,
            if writable { "writable" } else { "read-only" }
        ),
        Outcome::Stored {
            value,
            physical_address,
        } => format!(
            "Stored value {} at virtual address {} (physical address {})",
            value, v_addr, physical_address
        ),
        Outcome::Loaded {
            value,
            physical_address,
        } => format!(
            "The value {} is virtual address {} (physical address {})",
            value, v_addr, physical_address
        ),
    }
}

fn dump<R: Replacer>(sim: &Simulator<R>) {
    for frame in 0..sim.config().frame_count {
        let owner = match sim.frame_state(frame) {
            FrameState::Free => "free".to_string(),
            FrameState::PageTable { pid } => format!("page table of pid {}", pid),
            FrameState::Data { pid, v_page } => format!("page {} of pid {}", v_page, pid),
        };

        println!(
            "frame {}: {} [{}]",
            frame,
            String::from_utf8_lossy(sim.frame_bytes(frame)),
            owner
        );
    }
}
