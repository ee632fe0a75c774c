//! Small DNA helpers shared by the filter, the scorer and the pair assembler.

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}

pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

/// GC content in percent; ambiguous bases count towards the length only.
pub fn gc_percent(seq: &str) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq.bytes().filter(|b| matches!(b, b'G' | b'C' | b'g' | b'c')).count();
    100.0 * gc as f64 / seq.len() as f64
}

pub fn count_ambiguous(seq: &str) -> usize {
    seq.bytes().filter(|b| !is_acgt(*b)).count()
}

/// Length of the longest run of one identical base.
pub fn longest_homopolymer(seq: &str) -> usize {
    seq.as_bytes()
        .chunk_by(|a, b| a.eq_ignore_ascii_case(b))
        .map(<[u8]>::len)
        .max()
        .unwrap_or(0)
}

/// Number of G/C bases among the last `window` bases.
pub fn gc_at_three_prime(seq: &str, window: usize) -> usize {
    let bytes = seq.as_bytes();
    let from = bytes.len().saturating_sub(window);
    bytes[from..].iter().filter(|b| matches!(b, b'G' | b'C' | b'g' | b'c')).count()
}

pub fn is_acgt(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// IUPAC nucleotide codes, including the ambiguity letters.
pub fn is_iupac(base: u8) -> bool {
    matches!(
        base.to_ascii_uppercase(),
        b'A' | b'C' | b'G' | b'T' | b'N' | b'R' | b'Y' | b'K' | b'M' | b'S' | b'W' | b'B' | b'D' | b'H' | b'V'
    )
}
