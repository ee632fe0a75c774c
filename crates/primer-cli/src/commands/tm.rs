use crate::cli::TmArgs;
use crate::error::{CliError, Result};
use primerpp::core::thermo::{ThermoConditions, melting_temperature};
use tracing::{debug, info};

fn conditions(args: &TmArgs) -> ThermoConditions {
    ThermoConditions {
        dna_conc_nm: args.dna_conc,
        monovalent_conc_mm: args.salt,
        divalent_conc_mm: args.divalent,
        dntp_conc_mm: args.dntp,
        method: args.method.into(),
        salt_correction: args.salt_correction.into(),
    }
}

fn tm_line(sequence: &str, conditions: &ThermoConditions) -> Result<String> {
    let tm = melting_temperature(sequence, conditions)
        .map_err(|e| CliError::Argument(format!("Sequence '{}': {}", sequence, e)))?;
    Ok(format!("{}\t{:.2}", sequence, tm))
}

pub fn run(args: &TmArgs) -> Result<()> {
    let conditions = conditions(args);
    debug!(?conditions, "Melting temperature conditions.");
    info!(count = args.sequences.len(), "Computing melting temperatures.");

    for sequence in &args.sequences {
        println!("{}", tm_line(sequence, &conditions)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(argv: &[&str]) -> TmArgs {
        match Cli::parse_from(argv).command {
            Commands::Tm(args) => args,
            other => panic!("expected the tm command, got {other:?}"),
        }
    }

    #[test]
    fn flags_map_onto_thermo_conditions() {
        let args = parse(&["primerpp", "tm", "ACGT", "--salt", "20", "--divalent", "1.5", "--method", "santa-lucia"]);
        let conditions = conditions(&args);
        assert_eq!(conditions.monovalent_conc_mm, 20.0);
        assert_eq!(conditions.divalent_conc_mm, 1.5);
        assert_eq!(conditions.dna_conc_nm, 50.0);
        assert_eq!(conditions.method, primerpp::core::thermo::TmMethod::SantaLucia);
    }

    #[test]
    fn line_reports_sequence_and_tm() {
        let conditions = ThermoConditions::default();
        let line = tm_line("ACGTTGCAACGTTGCAACGT", &conditions).unwrap();
        let (sequence, tm) = line.split_once('\t').unwrap();
        assert_eq!(sequence, "ACGTTGCAACGTTGCAACGT");
        let expected = melting_temperature(sequence, &conditions).unwrap();
        assert_eq!(tm, format!("{:.2}", expected));
    }

    #[test]
    fn invalid_sequence_is_an_argument_error() {
        let err = tm_line("ACXT", &ThermoConditions::default()).unwrap_err();
        match err {
            CliError::Argument(msg) => assert!(msg.starts_with("Sequence 'ACXT':")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
