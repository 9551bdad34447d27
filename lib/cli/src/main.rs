use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use elapsed::measure_time;
use itertools::Itertools;
use log::{debug, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use sat_anatomy_core::cnf::Cnf;
use sat_anatomy_core::lit::Lit;
use sat_anatomy_core::monitor::CountingMonitor;
use sat_anatomy_core::op::atomic_sets::AtomicSetAnalysis;
use sat_anatomy_core::op::twise::{CoverStrategy, PresenceCondition, TWiseSampler};
use sat_anatomy_core::oracle::Oracle;
use sat_anatomy_core::solver::{BacktrackSolver, Options};

use crate::parsing::parse_comma_separated_intervals;

mod parsing;

// Run:
// cargo run -p sat-anatomy-cli -- atomic-sets data/my.cnf
// cargo run -p sat-anatomy-cli -- twise data/my.cnf -t 2 -o sample.txt

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition the variables into atomic sets.
    AtomicSets {
        /// Input file with CNF in DIMACS format.
        #[arg(value_name = "CNF")]
        path_cnf: PathBuf,

        /// Comma-separated list of variables to analyze (1-based indices).
        #[arg(long = "vars", value_name = "INT...")]
        variables: Option<String>,

        #[command(flatten)]
        solver: SolverArgs,
    },

    /// Sample configurations covering every t-wise combination of literals.
    Twise {
        /// Input file with CNF in DIMACS format.
        #[arg(value_name = "CNF")]
        path_cnf: PathBuf,

        /// Combination strength.
        #[arg(short, value_name = "INT", default_value_t = 2)]
        t: usize,

        /// Do not consult the solver while covering.
        #[arg(long)]
        no_sat: bool,

        /// Path to an output file with configurations.
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        path_output: Option<PathBuf>,

        #[command(flatten)]
        solver: SolverArgs,
    },
}

#[derive(Args, Debug)]
struct SolverArgs {
    /// Random seed.
    #[arg(long, value_name = "INT", default_value_t = 42)]
    seed: u64,

    /// Conflicts allowed per solver call.
    #[arg(long, value_name = "INT")]
    conflict_limit: Option<usize>,

    /// Time allowed per solver call, in milliseconds.
    #[arg(long, value_name = "INT")]
    time_limit_ms: Option<u64>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
    debug!("args = {:?}", args);

    match args.command {
        Command::AtomicSets {
            path_cnf,
            variables,
            solver,
        } => run_atomic_sets(&path_cnf, variables.as_deref(), &solver),
        Command::Twise {
            path_cnf,
            t,
            no_sat,
            path_output,
            solver,
        } => run_twise(&path_cnf, t, no_sat, path_output.as_deref(), &solver),
    }
}

fn load_oracle(path_cnf: &Path, args: &SolverArgs) -> color_eyre::Result<Oracle<BacktrackSolver>> {
    let cnf = Cnf::from_file(path_cnf)?;
    info!("cnf: {} variables, {} clauses", cnf.num_vars(), cnf.clauses.len());

    let options = Options {
        conflict_limit: args.conflict_limit,
        time_limit: args.time_limit_ms.map(Duration::from_millis),
    };
    let oracle = Oracle::from_cnf(BacktrackSolver::with_options(options), &cnf);
    info!("oracle = {}", oracle);
    Ok(oracle)
}

fn run_atomic_sets(path_cnf: &Path, variables: Option<&str>, args: &SolverArgs) -> color_eyre::Result<()> {
    let mut oracle = load_oracle(path_cnf, args)?;

    let mut analysis = AtomicSetAnalysis::new().with_seed(args.seed);
    if let Some(variables) = variables {
        analysis = analysis.with_variables(parse_comma_separated_intervals(variables)?);
    }

    let mut monitor = CountingMonitor::new();
    let (elapsed, sets) = measure_time(|| analysis.analyze(&mut oracle, &mut monitor));
    let sets = sets?;
    info!("Found {} atomic sets in {} ({} timeouts)", sets.len(), elapsed, monitor.timeouts());
    let solver = oracle.solver();
    debug!(
        "solver: {} solves, {} decisions, {} conflicts",
        solver.num_solves(),
        solver.num_decisions(),
        solver.num_conflicts()
    );

    for (i, set) in sets.iter().enumerate() {
        let label = if i == 0 { "core".to_string() } else { format!("set {}", i) };
        println!("{}: {}", label, set.iter().join(" "));
    }
    Ok(())
}

fn run_twise(
    path_cnf: &Path,
    t: usize,
    no_sat: bool,
    path_output: Option<&Path>,
    args: &SolverArgs,
) -> color_eyre::Result<()> {
    let mut oracle = load_oracle(path_cnf, args)?;
    let mut monitor = CountingMonitor::new();

    // Literals of core/dead variables can never be combined freely.
    let sets = AtomicSetAnalysis::new()
        .with_seed(args.seed)
        .analyze(&mut oracle, &mut monitor)?;
    let core = sets.first().map(|core| core.iter().map(|lit| lit.var()).collect_vec()).unwrap_or_default();
    let conditions = (1..=oracle.num_vars() as u32)
        .filter(|var| !core.contains(var))
        .flat_map(|var| [Lit::new(var as i32), Lit::new(-(var as i32))])
        .map(PresenceCondition::from_lit)
        .collect_vec();
    info!("{} presence conditions ({} core/dead variables)", conditions.len(), core.len());

    let mut sampler = TWiseSampler::new(conditions, t).with_seed(args.seed);
    if no_sat {
        sampler = sampler.with_strategy(CoverStrategy::cover_no_sat());
    }
    let (elapsed, sample) = if no_sat {
        measure_time(|| sampler.sample_without_oracle(oracle.num_vars(), &mut monitor))
    } else {
        measure_time(|| sampler.sample(&mut oracle, &mut monitor))
    };
    let sample = sample?;
    info!(
        "Sampled {} configurations in {} ({} invalid combinations, {} timeouts)",
        sample.configurations.len(),
        elapsed,
        sample.invalid.len(),
        monitor.timeouts()
    );
    debug!("stats = {:?}", sample.stats);

    let mut writer: Box<dyn Write> = match path_output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    for assignment in sample.assignments() {
        writeln!(writer, "{} 0", assignment.literals().join(" "))?;
    }
    writer.flush()?;
    Ok(())
}
