use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};

/// Thermodynamic parameters for one stacked base pair, expressed for duplex
/// formation: enthalpy in kcal/mol, entropy in cal/(K·mol), free energy in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StackParams {
    pub enthalpy: f64,
    pub entropy: f64,
    pub free_energy: f64,
}

impl StackParams {
    pub const fn new(enthalpy: f64, entropy: f64, free_energy: f64) -> Self {
        Self {
            enthalpy,
            entropy,
            free_energy,
        }
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            enthalpy: self.enthalpy * factor,
            entropy: self.entropy * factor,
            free_energy: self.free_energy * factor,
        }
    }
}

impl std::ops::Add for StackParams {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            enthalpy: self.enthalpy + rhs.enthalpy,
            entropy: self.entropy + rhs.entropy,
            free_energy: self.free_energy + rhs.free_energy,
        }
    }
}

impl std::ops::AddAssign for StackParams {
    fn add_assign(&mut self, rhs: Self) {
        self.enthalpy += rhs.enthalpy;
        self.entropy += rhs.entropy;
        self.free_energy += rhs.free_energy;
    }
}

/// Nearest-neighbor parameter table used for Tm and ΔG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TmMethod {
    /// Breslauer et al. (1986) table with the Rychlik et al. (1990) Tm method.
    #[default]
    Breslauer,
    /// SantaLucia (1998) unified table.
    SantaLucia,
}

/// Salt correction formula applied when converting ΔH/ΔS into a Tm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaltCorrection {
    /// Schildkraut & Lifson (1965): a fixed 16.6·log10[Na+] offset.
    #[default]
    Schildkraut,
    /// SantaLucia (1998): entropy correction proportional to the number of phosphates.
    SantaLucia,
    /// Owczarzy et al. (2004): GC-dependent correction of 1/Tm.
    Owczarzy,
}

// Breslauer et al. (1986), converted from disruption values.
static BRESLAUER_STACKS: Map<&'static str, StackParams> = phf_map! {
    "AA" => StackParams::new(-9.1, -24.0, -1.9),
    "AC" => StackParams::new(-6.5, -17.3, -1.3),
    "AG" => StackParams::new(-7.8, -20.8, -1.6),
    "AT" => StackParams::new(-8.6, -23.9, -1.5),
    "CA" => StackParams::new(-5.8, -12.9, -1.9),
    "CC" => StackParams::new(-11.0, -26.6, -3.1),
    "CG" => StackParams::new(-11.9, -27.8, -3.6),
    "CT" => StackParams::new(-7.8, -20.8, -1.6),
    "GA" => StackParams::new(-5.6, -13.5, -1.6),
    "GC" => StackParams::new(-11.1, -26.7, -3.1),
    "GG" => StackParams::new(-11.0, -26.6, -3.1),
    "GT" => StackParams::new(-6.5, -17.3, -1.3),
    "TA" => StackParams::new(-6.0, -16.9, -0.9),
    "TC" => StackParams::new(-5.6, -13.5, -1.6),
    "TG" => StackParams::new(-5.8, -12.9, -1.9),
    "TT" => StackParams::new(-9.1, -24.0, -1.9),
};

// SantaLucia (1998), Table 2 (unified oligonucleotide parameters).
static SANTALUCIA_STACKS: Map<&'static str, StackParams> = phf_map! {
    "AA" => StackParams::new(-7.9, -22.2, -1.00),
    "AC" => StackParams::new(-8.4, -22.4, -1.44),
    "AG" => StackParams::new(-7.8, -21.0, -1.28),
    "AT" => StackParams::new(-7.2, -20.4, -0.88),
    "CA" => StackParams::new(-8.5, -22.7, -1.45),
    "CC" => StackParams::new(-8.0, -19.9, -1.84),
    "CG" => StackParams::new(-10.6, -27.2, -2.17),
    "CT" => StackParams::new(-7.8, -21.0, -1.28),
    "GA" => StackParams::new(-8.2, -22.2, -1.30),
    "GC" => StackParams::new(-9.8, -24.4, -2.24),
    "GG" => StackParams::new(-8.0, -19.9, -1.84),
    "GT" => StackParams::new(-8.4, -22.4, -1.44),
    "TA" => StackParams::new(-7.2, -21.3, -0.58),
    "TC" => StackParams::new(-8.2, -22.2, -1.30),
    "TG" => StackParams::new(-8.5, -22.7, -1.45),
    "TT" => StackParams::new(-7.9, -22.2, -1.00),
};

const BRESLAUER_INITIATION: StackParams = StackParams::new(0.0, -10.8, 0.0);

// Per duplex end, SantaLucia (1998).
const SANTALUCIA_TERMINAL_GC: StackParams = StackParams::new(0.1, -2.8, 0.98);
const SANTALUCIA_TERMINAL_AT: StackParams = StackParams::new(2.3, 4.1, 1.03);
const SANTALUCIA_SYMMETRY: StackParams = StackParams::new(0.0, -1.4, 0.43);

const CONCRETE_BASES: [u8; 4] = *b"ACGT";

impl TmMethod {
    /// Stack parameters for the dinucleotide `first``second` (5'→3'), both upper case.
    ///
    /// An `N` on either side is resolved to the mean over the concrete bases it may stand for.
    pub fn stack(self, first: u8, second: u8) -> StackParams {
        let table = match self {
            TmMethod::Breslauer => &BRESLAUER_STACKS,
            TmMethod::SantaLucia => &SANTALUCIA_STACKS,
        };
        let firsts: &[u8] = if first == b'N' { &CONCRETE_BASES } else { std::slice::from_ref(&first) };
        let seconds: &[u8] = if second == b'N' { &CONCRETE_BASES } else { std::slice::from_ref(&second) };

        let mut sum = StackParams::default();
        let mut count = 0usize;
        for &a in firsts {
            for &b in seconds {
                let key = [a, b];
                let key = std::str::from_utf8(&key).unwrap_or_default();
                if let Some(params) = table.get(key) {
                    sum += *params;
                    count += 1;
                }
            }
        }
        if count == 0 {
            StackParams::default()
        } else {
            sum.scaled(1.0 / count as f64)
        }
    }

    /// Initiation terms for a duplex with the given terminal bases.
    pub fn initiation(self, five_prime: u8, three_prime: u8) -> StackParams {
        match self {
            TmMethod::Breslauer => BRESLAUER_INITIATION,
            TmMethod::SantaLucia => santalucia_terminal(five_prime) + santalucia_terminal(three_prime),
        }
    }

    /// Extra terms applied to self-complementary duplexes.
    pub fn symmetry_correction(self) -> StackParams {
        match self {
            TmMethod::Breslauer => StackParams::default(),
            TmMethod::SantaLucia => SANTALUCIA_SYMMETRY,
        }
    }
}

fn santalucia_terminal(base: u8) -> StackParams {
    match base {
        b'A' | b'T' => SANTALUCIA_TERMINAL_AT,
        b'G' | b'C' => SANTALUCIA_TERMINAL_GC,
        _ => (SANTALUCIA_TERMINAL_AT + SANTALUCIA_TERMINAL_GC).scaled(0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complementary_dinucleotides_share_parameters() {
        for method in [TmMethod::Breslauer, TmMethod::SantaLucia] {
            assert_eq!(method.stack(b'A', b'A'), method.stack(b'T', b'T'));
            assert_eq!(method.stack(b'C', b'A'), method.stack(b'T', b'G'));
            assert_eq!(method.stack(b'G', b'T'), method.stack(b'A', b'C'));
            assert_eq!(method.stack(b'C', b'T'), method.stack(b'A', b'G'));
            assert_eq!(method.stack(b'G', b'A'), method.stack(b'T', b'C'));
            assert_eq!(method.stack(b'G', b'G'), method.stack(b'C', b'C'));
        }
    }

    #[test]
    fn ambiguous_stack_is_mean_of_concrete_stacks() {
        let method = TmMethod::Breslauer;
        let expected = (method.stack(b'A', b'A').enthalpy
            + method.stack(b'A', b'C').enthalpy
            + method.stack(b'A', b'G').enthalpy
            + method.stack(b'A', b'T').enthalpy)
            / 4.0;
        let actual = method.stack(b'A', b'N').enthalpy;
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn santalucia_initiation_depends_on_terminal_bases() {
        let gc_ends = TmMethod::SantaLucia.initiation(b'G', b'C');
        let at_ends = TmMethod::SantaLucia.initiation(b'A', b'T');
        assert!((gc_ends.free_energy - 1.96).abs() < 1e-9);
        assert!((at_ends.free_energy - 2.06).abs() < 1e-9);
    }

    #[test]
    fn breslauer_has_no_symmetry_correction() {
        assert_eq!(TmMethod::Breslauer.symmetry_correction(), StackParams::default());
        assert_eq!(TmMethod::SantaLucia.symmetry_correction().entropy, -1.4);
    }
}
