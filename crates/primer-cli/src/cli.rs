use clap::{Args, Parser, Subcommand, ValueEnum};
use primerpp::core::thermo::{SaltCorrection, TmMethod};
use primerpp::engine::config::Task;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "Primer++ CLI - Design PCR primer pairs and hybridization probes with nearest-neighbor thermodynamics.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for batch designs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Design primers (and optionally internal oligos) for every sequence record in a file.
    Design(DesignArgs),
    /// Print the melting temperature of one or more oligos.
    Tm(TmArgs),
}

/// Arguments for the `design` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DesignArgs {
    // --- Core Arguments ---
    /// Path to the input file with one or more `[[sequence]]` records in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a settings file in TOML format. Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the report to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    // --- Selection Overrides ---
    /// Override the task from the settings file.
    #[arg(short, long, value_enum, value_name = "TASK")]
    pub task: Option<TaskArg>,

    /// Override the number of pairs (or oligos per role) to return.
    #[arg(short, long, value_name = "INT")]
    pub num_return: Option<usize>,

    /// Override the product size ranges, e.g. `100-300` or `100-150,200-250`.
    #[arg(long, value_name = "RANGES")]
    pub product_size: Option<String>,

    // --- Library Overrides ---
    /// FASTA file of sequences that primers must not resemble.
    #[arg(long, value_name = "PATH")]
    pub mispriming_library: Option<PathBuf>,

    /// FASTA file of sequences that internal oligos must not resemble.
    #[arg(long, value_name = "PATH")]
    pub mishyb_library: Option<PathBuf>,

    /// Set a specific configuration value, overriding the settings file.
    /// Can be used multiple times. Example: -S primer.opt-tm=61.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `tm` subcommand.
#[derive(Args, Debug, Clone)]
pub struct TmArgs {
    /// Oligo sequences (5'->3').
    #[arg(required = true, value_name = "SEQUENCE")]
    pub sequences: Vec<String>,

    /// Monovalent cation concentration (mM).
    #[arg(short, long, default_value_t = 50.0, value_name = "MM")]
    pub salt: f64,

    /// Divalent cation concentration (mM).
    #[arg(long, default_value_t = 0.0, value_name = "MM")]
    pub divalent: f64,

    /// dNTP concentration (mM).
    #[arg(long, default_value_t = 0.0, value_name = "MM")]
    pub dntp: f64,

    /// Oligo concentration (nM).
    #[arg(short, long, default_value_t = 50.0, value_name = "NM")]
    pub dna_conc: f64,

    /// Nearest-neighbor parameter table.
    #[arg(long, value_enum, default_value_t = TmMethodArg::Breslauer)]
    pub method: TmMethodArg,

    /// Salt correction formula.
    #[arg(long, value_enum, default_value_t = SaltCorrectionArg::Schildkraut)]
    pub salt_correction: SaltCorrectionArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskArg {
    PcrPrimers,
    PcrPrimersWithProbe,
    LeftOnly,
    RightOnly,
    ProbeOnly,
}

impl From<TaskArg> for Task {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::PcrPrimers => Task::PcrPrimers,
            TaskArg::PcrPrimersWithProbe => Task::PcrPrimersWithProbe,
            TaskArg::LeftOnly => Task::LeftOnly,
            TaskArg::RightOnly => Task::RightOnly,
            TaskArg::ProbeOnly => Task::ProbeOnly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmMethodArg {
    Breslauer,
    SantaLucia,
}

impl From<TmMethodArg> for TmMethod {
    fn from(arg: TmMethodArg) -> Self {
        match arg {
            TmMethodArg::Breslauer => TmMethod::Breslauer,
            TmMethodArg::SantaLucia => TmMethod::SantaLucia,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltCorrectionArg {
    Schildkraut,
    SantaLucia,
    Owczarzy,
}

impl From<SaltCorrectionArg> for SaltCorrection {
    fn from(arg: SaltCorrectionArg) -> Self {
        match arg {
            SaltCorrectionArg::Schildkraut => SaltCorrection::Schildkraut,
            SaltCorrectionArg::SantaLucia => SaltCorrection::SantaLucia,
            SaltCorrectionArg::Owczarzy => SaltCorrection::Owczarzy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn design_arguments_parse_with_repeated_set_values() {
        let cli = Cli::try_parse_from([
            "primerpp",
            "-vv",
            "design",
            "-i",
            "seqs.toml",
            "--task",
            "pcr-primers-with-probe",
            "-S",
            "num-return=3",
            "-S",
            "primer.opt-tm=61",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Design(args) = cli.command else {
            panic!("expected the design command");
        };
        assert_eq!(args.input, PathBuf::from("seqs.toml"));
        assert_eq!(args.task.map(Task::from), Some(Task::PcrPrimersWithProbe));
        assert_eq!(args.set_values, vec!["num-return=3", "primer.opt-tm=61"]);
        assert_eq!(args.format, OutputFormat::Csv);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["primerpp", "-q", "-v", "tm", "ACGT"]);
        assert!(result.is_err());
    }

    #[test]
    fn tm_arguments_have_standard_defaults() {
        let cli = Cli::try_parse_from(["primerpp", "tm", "ACGTACGTACGTACGTACGT"]).unwrap();
        let Commands::Tm(args) = cli.command else {
            panic!("expected the tm command");
        };
        assert_eq!(args.salt, 50.0);
        assert_eq!(args.dna_conc, 50.0);
        assert_eq!(TmMethod::from(args.method), TmMethod::Breslauer);
    }
}
