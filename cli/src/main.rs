use anyhow::Result;
use assoc_cache::{
    shape::Shape,
    sim::{self, SimulationOption, TrialReport},
    source,
    stat::Stats,
};
use clap::{Args, Parser, Subcommand};
use terminal_size::terminal_size;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// simulate every lines/ways split of a fixed capacity
    Sweep(SweepArgs),
    /// simulate a single cache shape once
    Once(OnceArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// log2 of the number of addresses inserted per trial
    #[arg(short, long)]
    addresses: Option<u32>,
    /// Seed of the address generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    delegate: CommonArgs,
    /// log2 of the total number of slots
    #[arg(short, long, default_value_t = 5)]
    dim: u32,
    /// Number of trials per shape
    #[arg(short, long, default_value_t = 100)]
    trials: usize,
    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct OnceArgs {
    #[command(flatten)]
    delegate: CommonArgs,
    /// Cache shape as `<lines>x<ways>`, e.g. `8x4`
    shape: Shape,
    /// Print the cache contents
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Sweep(SweepArgs {
            delegate:
                CommonArgs {
                    addresses,
                    seed,
                    verbose,
                },
            dim,
            trials,
            json,
        }) => {
            init_logger(verbose);
            let option = SimulationOption {
                total_exponent: dim,
                trials,
                address_exponent: addresses,
            };
            let mut rng = source::seeded(seed);
            let reports = sim::sweep(&option, &mut rng)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{report}");
                }
            }
            output_stat(&reports);
            Ok(())
        }
        Command::Once(OnceArgs {
            delegate:
                CommonArgs {
                    addresses,
                    seed,
                    verbose,
                },
            shape,
            dump,
        }) => {
            init_logger(verbose);
            let mut rng = source::seeded(seed);
            let capacity_exponent = shape.lines.trailing_zeros() + shape.ways.trailing_zeros();
            let address_exponent =
                addresses.unwrap_or(capacity_exponent.min(sim::MAX_ADDRESS_EXPONENT));
            let cache = sim::fill_cache(shape, address_exponent, &mut rng)?;
            log::info!(
                "inserted {} addresses into {shape} cache (mask {:#06x})",
                1u32 << address_exponent,
                cache.mask()
            );
            if dump {
                print!("{cache}");
            }
            println!(
                "occupancy: {} / {}",
                cache.occupancy(),
                cache.lines() * cache.ways()
            );
            Ok(())
        }
    }
}

fn init_logger(verbose: bool) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
}

fn output_stat(reports: &[TrialReport]) {
    let max_width = get_terminal_width().unwrap_or(120) as usize;
    let mut stats = Stats::default();
    for report in reports {
        stats.push(report);
    }
    if stats.is_empty() {
        return;
    }
    log::info!("statistics:\n{}", stats.view(max_width));
}

fn get_terminal_width() -> Option<u16> {
    terminal_size().map(|(w, _)| w.0.saturating_sub(20))
}
