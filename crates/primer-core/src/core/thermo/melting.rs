use super::error::ThermoError;
use super::params::{SaltCorrection, StackParams, TmMethod};
use crate::core::models::sequence::reverse_complement;

/// Longest oligo, in bases, evaluated with the nearest-neighbor model.
pub const NN_MAX_LENGTH: usize = 36;

const GAS_CONSTANT: f64 = 1.987; // cal/(K·mol)
const KELVIN_OFFSET: f64 = 273.15;

/// Solution conditions shared by every Tm calculation of one oligo role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoConditions {
    pub dna_conc_nm: f64,
    pub monovalent_conc_mm: f64,
    pub divalent_conc_mm: f64,
    pub dntp_conc_mm: f64,
    pub method: TmMethod,
    pub salt_correction: SaltCorrection,
}

impl Default for ThermoConditions {
    fn default() -> Self {
        Self {
            dna_conc_nm: 50.0,
            monovalent_conc_mm: 50.0,
            divalent_conc_mm: 0.0,
            dntp_conc_mm: 0.0,
            method: TmMethod::default(),
            salt_correction: SaltCorrection::default(),
        }
    }
}

impl ThermoConditions {
    /// Monovalent-equivalent cation concentration in mM, folding in Mg2+ not chelated by dNTPs.
    pub fn effective_salt_mm(&self) -> f64 {
        effective_monovalent(self.monovalent_conc_mm, self.divalent_conc_mm, self.dntp_conc_mm)
    }
}

/// Converts divalent cations to a monovalent equivalent (von Ahsen et al., 2001).
pub fn effective_monovalent(monovalent_mm: f64, divalent_mm: f64, dntp_mm: f64) -> f64 {
    if divalent_mm > dntp_mm {
        monovalent_mm + 120.0 * (divalent_mm - dntp_mm).sqrt()
    } else {
        monovalent_mm
    }
}

fn normalize(seq: &str) -> Result<Vec<u8>, ThermoError> {
    if seq.is_empty() {
        return Err(ThermoError::Empty);
    }
    seq.bytes()
        .enumerate()
        .map(|(position, b)| match b.to_ascii_uppercase() {
            base @ (b'A' | b'C' | b'G' | b'T' | b'N') => Ok(base),
            _ => Err(ThermoError::InvalidBase {
                base: b as char,
                position,
            }),
        })
        .collect()
}

fn duplex_params(bases: &[u8], method: TmMethod) -> Result<(StackParams, bool), ThermoError> {
    if bases.len() < 2 {
        return Err(ThermoError::TooShort { length: bases.len() });
    }
    let mut total = bases
        .windows(2)
        .fold(StackParams::default(), |acc, w| acc + method.stack(w[0], w[1]));
    total += method.initiation(bases[0], bases[bases.len() - 1]);

    let symmetric = is_symmetric(bases);
    if symmetric {
        total += method.symmetry_correction();
    }
    Ok((total, symmetric))
}

fn is_symmetric(bases: &[u8]) -> bool {
    if bases.len() % 2 != 0 {
        return false;
    }
    bases
        .iter()
        .zip(bases.iter().rev())
        .all(|(&a, &b)| matches!((a, b), (b'A', b'T') | (b'T', b'A') | (b'C', b'G') | (b'G', b'C')))
}

/// Nearest-neighbor melting temperature (°C) of a short oligo.
///
/// The entropy term uses `C/4` for non-self-complementary duplexes and `C` for
/// self-complementary ones under the SantaLucia table, with `C` the oligo
/// concentration in molar.
pub fn melting_temperature(seq: &str, conditions: &ThermoConditions) -> Result<f64, ThermoError> {
    let bases = normalize(seq)?;
    let (params, symmetric) = duplex_params(&bases, conditions.method)?;

    let salt_molar = conditions.effective_salt_mm() / 1000.0;
    let oligo_molar = conditions.dna_conc_nm * 1e-9;
    let concentration_term = if symmetric && conditions.method == TmMethod::SantaLucia {
        oligo_molar
    } else {
        oligo_molar / 4.0
    };

    let enthalpy = params.enthalpy * 1000.0;
    let mut entropy = params.entropy;
    if conditions.salt_correction == SaltCorrection::SantaLucia {
        entropy += 0.368 * (bases.len() - 1) as f64 * salt_molar.ln();
    }
    let tm_kelvin = enthalpy / (entropy + GAS_CONSTANT * concentration_term.ln());

    let tm = match conditions.salt_correction {
        SaltCorrection::Schildkraut => tm_kelvin - KELVIN_OFFSET + 16.6 * salt_molar.log10(),
        SaltCorrection::SantaLucia => tm_kelvin - KELVIN_OFFSET,
        SaltCorrection::Owczarzy => {
            let gc_fraction = gc_fraction(&bases);
            let ln_salt = salt_molar.ln();
            let inverse = 1.0 / tm_kelvin
                + (4.29 * gc_fraction - 3.95) * 1e-5 * ln_salt
                + 9.40e-6 * ln_salt * ln_salt;
            1.0 / inverse - KELVIN_OFFSET
        }
    };
    Ok(tm)
}

fn gc_fraction(bases: &[u8]) -> f64 {
    let gc = bases.iter().filter(|&&b| b == b'G' || b == b'C').count();
    gc as f64 / bases.len() as f64
}

/// Empirical GC%-based Tm (°C) of `seq[start..start + length]`, for sequences beyond
/// the nearest-neighbor limit.
pub fn long_sequence_tm(seq: &str, start: usize, length: usize, salt_conc_mm: f64) -> Result<f64, ThermoError> {
    let end = start
        .checked_add(length)
        .filter(|&end| end <= seq.len())
        .ok_or(ThermoError::RegionOutOfBounds {
            start,
            length,
            sequence_length: seq.len(),
        })?;
    if length == 0 {
        return Err(ThermoError::Empty);
    }
    let bases = normalize(&seq[start..end])?;
    let gc_percent = 100.0 * gc_fraction(&bases);
    Ok(81.5 + 16.6 * (salt_conc_mm / 1000.0).log10() + 0.41 * gc_percent - 600.0 / length as f64)
}

/// Tm of any sequence: nearest-neighbor up to `nn_max_len` bases, GC% formula beyond.
pub fn sequence_tm(seq: &str, conditions: &ThermoConditions, nn_max_len: usize) -> Result<f64, ThermoError> {
    if seq.len() > nn_max_len {
        long_sequence_tm(seq, 0, seq.len(), conditions.effective_salt_mm())
    } else {
        melting_temperature(seq, conditions)
    }
}

/// Free energy (kcal/mol) needed to disrupt the full duplex; larger is more stable.
pub fn free_energy(seq: &str, method: TmMethod) -> Result<f64, ThermoError> {
    let bases = normalize(seq)?;
    let (params, _) = duplex_params(&bases, method)?;
    Ok(-params.free_energy)
}

/// Free energy of the last `window` bases of `seq` (the 3' end), or of the whole
/// sequence when it is shorter than the window.
pub fn end_free_energy(seq: &str, window: usize, method: TmMethod) -> Result<f64, ThermoError> {
    let tail = if seq.len() > window { &seq[seq.len() - window..] } else { seq };
    free_energy(tail, method)
}

/// True when `seq` equals its own reverse complement. Any `N` makes it false.
pub fn is_self_complementary(seq: &str) -> bool {
    if seq.is_empty() || seq.len() % 2 != 0 {
        return false;
    }
    let upper = seq.to_ascii_uppercase();
    if !upper.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
        return false;
    }
    reverse_complement(&upper) == upper
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(method: TmMethod, salt_correction: SaltCorrection) -> ThermoConditions {
        ThermoConditions {
            method,
            salt_correction,
            ..ThermoConditions::default()
        }
    }

    #[test]
    fn gc_only_oligo_melts_higher_than_at_only_oligo() {
        for method in [TmMethod::Breslauer, TmMethod::SantaLucia] {
            for corr in [SaltCorrection::Schildkraut, SaltCorrection::SantaLucia, SaltCorrection::Owczarzy] {
                let c = conditions(method, corr);
                let gc = melting_temperature("GGGCCGGCCCGGGCCGGCGC", &c).unwrap();
                let at = melting_temperature("AAATTAATTTAAATTAATAT", &c).unwrap();
                assert!(gc > at, "{method:?}/{corr:?}: {gc} <= {at}");
            }
        }
    }

    #[test]
    fn typical_twenty_mer_melts_near_sixty_degrees() {
        let tm = melting_temperature("AGCTGATCCGATTGCAGGTC", &ThermoConditions::default()).unwrap();
        assert!(tm > 50.0 && tm < 70.0, "tm = {tm}");
    }

    #[test]
    fn higher_salt_raises_tm() {
        let low = ThermoConditions::default();
        let high = ThermoConditions {
            monovalent_conc_mm: 500.0,
            ..low
        };
        let seq = "AGCTGATCCGATTGCAGGTC";
        assert!(melting_temperature(seq, &high).unwrap() > melting_temperature(seq, &low).unwrap());
    }

    #[test]
    fn divalent_cations_add_to_monovalent_equivalent() {
        assert_eq!(effective_monovalent(50.0, 0.0, 0.0), 50.0);
        assert_eq!(effective_monovalent(50.0, 1.0, 2.0), 50.0);
        assert!((effective_monovalent(50.0, 1.5, 0.5) - 170.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_base_is_reported_with_position() {
        let err = melting_temperature("ACGXT", &ThermoConditions::default()).unwrap_err();
        assert_eq!(err, ThermoError::InvalidBase { base: 'X', position: 3 });
    }

    #[test]
    fn empty_sequence_is_undefined() {
        assert_eq!(melting_temperature("", &ThermoConditions::default()), Err(ThermoError::Empty));
        assert_eq!(free_energy("", TmMethod::Breslauer), Err(ThermoError::Empty));
    }

    #[test]
    fn lowercase_input_matches_uppercase() {
        let c = ThermoConditions::default();
        assert_eq!(
            melting_temperature("acgtacgtacgtacgtacgt", &c).unwrap(),
            melting_temperature("ACGTACGTACGTACGTACGT", &c).unwrap()
        );
    }

    #[test]
    fn long_sequence_tm_follows_gc_formula() {
        let seq = "GC".repeat(50);
        let tm = long_sequence_tm(&seq, 0, 100, 50.0).unwrap();
        let expected = 81.5 + 16.6 * (0.05f64).log10() + 0.41 * 100.0 - 6.0;
        assert!((tm - expected).abs() < 1e-9);
    }

    #[test]
    fn long_sequence_tm_rejects_region_past_end() {
        let err = long_sequence_tm("ACGT", 2, 5, 50.0).unwrap_err();
        assert!(matches!(err, ThermoError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn sequence_tm_dispatches_on_length() {
        let c = ThermoConditions::default();
        let short = "AGCTGATCCGATTGCAGGTC";
        assert_eq!(sequence_tm(short, &c, NN_MAX_LENGTH).unwrap(), melting_temperature(short, &c).unwrap());

        let long = short.repeat(3);
        assert_eq!(
            sequence_tm(&long, &c, NN_MAX_LENGTH).unwrap(),
            long_sequence_tm(&long, 0, long.len(), 50.0).unwrap()
        );
    }

    #[test]
    fn end_free_energy_uses_only_three_prime_window() {
        let m = TmMethod::Breslauer;
        assert_eq!(end_free_energy("AAAAAAAAGCGCG", 5, m).unwrap(), free_energy("GCGCG", m).unwrap());
        assert_eq!(end_free_energy("GCG", 5, m).unwrap(), free_energy("GCG", m).unwrap());
    }

    #[test]
    fn gc_rich_three_prime_end_is_more_stable() {
        let m = TmMethod::SantaLucia;
        assert!(end_free_energy("ATATAGCGCG", 5, m).unwrap() > end_free_energy("GCGCGATATA", 5, m).unwrap());
    }

    #[test]
    fn palindromes_are_detected() {
        assert!(is_self_complementary("GGATCC"));
        assert!(is_self_complementary("gaattc"));
        assert!(!is_self_complementary("AAAA"));
        assert!(!is_self_complementary("GGANCC"));
        assert!(!is_self_complementary("GGA"));
        assert!(!is_self_complementary(""));
    }
}
