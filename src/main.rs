use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::{Memory, Processor};

/// Runs an LS-8 program until it halts.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Program file, resolved relative to `--dir`
    program: PathBuf,

    /// Directory holding the programs
    #[arg(short, long, default_value = "examples")]
    dir: PathBuf,

    /// Log more, may be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log the CPU state before every instruction
    #[arg(long)]
    trace: bool,

    /// Log the contents of memory after loading
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn level(&self) -> LevelFilter {
        if self.trace {
            return LevelFilter::Trace;
        }

        let level = match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // the dump is logged at info
        if self.dump {
            level.max(LevelFilter::Info)
        } else {
            level
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(args.level())
        .init()
        .wrap_err("failed to initialize logging")?;

    let path = args.dir.join(&args.program);
    let mut mem = Memory::from_file(&path)
        .wrap_err_with(|| format!("failed to load `{}`", args.program.display()))?;
    if args.dump {
        mem.dump();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut cpu = Processor::new();
    cpu.run(&mut mem, &mut out)
        .wrap_err_with(|| format!("`{}` stopped with a fault", args.program.display()))?;
    out.flush()?;

    Ok(())
}
