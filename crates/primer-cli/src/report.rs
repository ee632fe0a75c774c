use crate::error::Result;
use primerpp::core::alignment::AlignScore;
use primerpp::core::models::oligo::{OligoCandidate, OligoRole};
use primerpp::core::models::pair::PrimerPair;
use primerpp::engine::result::{EngineResult, OutputType};
use serde::Serialize;
use std::io::Write;

/// One designed sequence, as handed to the writers.
pub struct Report<'a> {
    pub name: &'a str,
    pub result: &'a EngineResult,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub first_base_index: i64,
    pub num_return: usize,
}

// Right primers are reported at their 5' base, everything else at its leftmost base.
fn reported_position(result: &EngineResult, oligo: &OligoCandidate, first_base_index: i64) -> i64 {
    (result.included_start + oligo.five_prime()) as i64 + first_base_index
}

fn role_heading(role: OligoRole) -> &'static str {
    match role {
        OligoRole::Left => "LEFT PRIMER",
        OligoRole::Right => "RIGHT PRIMER",
        OligoRole::Internal => "INTERNAL OLIGO",
    }
}

fn score_text(score: Option<AlignScore>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

fn write_oligo_header<W: Write>(out: &mut W) -> Result<()> {
    writeln!(
        out,
        "  {:<16}{:>7}{:>5}{:>8}{:>8}{:>7}{:>7}{:>9}  SEQUENCE",
        "OLIGO", "START", "LEN", "TM", "GC%", "ANY", "3'", "QUALITY"
    )?;
    Ok(())
}

fn write_oligo_line<W: Write>(out: &mut W, result: &EngineResult, oligo: &OligoCandidate, options: &ReportOptions) -> Result<()> {
    writeln!(
        out,
        "  {:<16}{:>7}{:>5}{:>8.2}{:>8.2}{:>7}{:>7}{:>9.3}  {}",
        role_heading(oligo.role),
        reported_position(result, oligo, options.first_base_index),
        oligo.length,
        oligo.tm,
        oligo.gc_percent,
        score_text(oligo.self_any),
        score_text(oligo.self_end),
        oligo.quality,
        oligo.sequence
    )?;
    Ok(())
}

fn write_pair<W: Write>(
    out: &mut W,
    rank: usize,
    result: &EngineResult,
    pair: &PrimerPair,
    options: &ReportOptions,
) -> Result<()> {
    writeln!(out, "PAIR {}  quality {:.4}", rank, pair.quality)?;
    write_oligo_header(out)?;
    write_oligo_line(out, result, result.left_of(pair), options)?;
    write_oligo_line(out, result, result.right_of(pair), options)?;
    if let Some(internal) = result.internal_of(pair) {
        write_oligo_line(out, result, internal, options)?;
    }
    writeln!(
        out,
        "  PRODUCT SIZE {}, PRODUCT TM {:.2}, TM DIFF {:.2}, ANY COMPL {}, 3' COMPL {}",
        pair.product_size,
        pair.product_tm,
        pair.diff_tm,
        score_text(pair.compl_any),
        score_text(pair.compl_end)
    )?;
    if let Some(name) = &pair.repeat_name {
        writeln!(out, "  REPEAT SIMILARITY {} ({})", score_text(pair.repeat_similarity), name)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_sequence<W: Write>(out: &mut W, report: &Report<'_>, options: &ReportOptions) -> Result<()> {
    let result = report.result;
    writeln!(out, "SEQUENCE {}", report.name)?;
    if !result.global_errors.is_empty() {
        writeln!(out, "ERROR: {}", result.global_errors.as_str())?;
    }
    if !result.per_sequence_errors.is_empty() {
        writeln!(out, "ERROR: {}", result.per_sequence_errors.as_str())?;
    }
    if !result.warnings.is_empty() {
        writeln!(out, "WARNING: {}", result.warnings.as_str())?;
    }
    if let Some(stop) = result.stop_codon_pos {
        writeln!(
            out,
            "STOP CODON POSITION {}",
            stop + result.included_start as i64 + options.first_base_index
        )?;
    }
    writeln!(out)?;

    match result.output_type {
        OutputType::PrimerPairs => {
            if result.best_pairs.is_empty() && result.is_ok() {
                writeln!(out, "NO ACCEPTABLE PAIRS FOUND\n")?;
            }
            for (index, pair) in result.best_pairs.iter().enumerate() {
                write_pair(out, index + 1, result, pair, options)?;
            }
        }
        OutputType::PrimerList => {
            for role in OligoRole::ALL {
                let collection = result.collection(role);
                if collection.is_empty() {
                    continue;
                }
                write_oligo_header(out)?;
                for oligo in collection.ranked().into_iter().take(options.num_return) {
                    write_oligo_line(out, result, oligo, options)?;
                }
                writeln!(out)?;
            }
        }
    }

    writeln!(out, "STATISTICS")?;
    for role in OligoRole::ALL {
        let stats = &result.collection(role).stats;
        if stats.considered > 0 {
            writeln!(out, "  {:<16}{}", role_heading(role), stats)?;
        }
    }
    if result.output_type == OutputType::PrimerPairs {
        writeln!(out, "  {:<16}{}", "PAIR", result.best_pairs.stats)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Writes a human-readable report for every sequence.
pub fn write_text<W: Write>(out: &mut W, reports: &[Report<'_>], options: &ReportOptions) -> Result<()> {
    for report in reports {
        write_sequence(out, report, options)?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    sequence: &'a str,
    rank: usize,
    role: &'static str,
    start: i64,
    length: usize,
    tm: f64,
    gc_percent: f64,
    self_any: Option<f64>,
    self_end: Option<f64>,
    quality: f64,
    oligo: &'a str,
    pair_quality: Option<f64>,
    product_size: Option<usize>,
    product_tm: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<'a> CsvRow<'a> {
    fn new(name: &'a str, rank: usize, result: &EngineResult, oligo: &'a OligoCandidate, options: &ReportOptions) -> Self {
        Self {
            sequence: name,
            rank,
            role: oligo.role.label(),
            start: reported_position(result, oligo, options.first_base_index),
            length: oligo.length,
            tm: round2(oligo.tm),
            gc_percent: round2(oligo.gc_percent),
            self_any: oligo.self_any.map(AlignScore::as_f64),
            self_end: oligo.self_end.map(AlignScore::as_f64),
            quality: oligo.quality,
            oligo: &oligo.sequence,
            pair_quality: None,
            product_size: None,
            product_tm: None,
        }
    }

    fn with_pair(mut self, pair: &PrimerPair) -> Self {
        self.pair_quality = Some(pair.quality);
        self.product_size = Some(pair.product_size);
        self.product_tm = Some(round2(pair.product_tm));
        self
    }
}

/// Writes one CSV row per reported oligo. Pair members share a rank and carry
/// the pair columns. Sequences that failed produce no rows.
pub fn write_csv<W: Write>(out: W, reports: &[Report<'_>], options: &ReportOptions) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for report in reports {
        let result = report.result;
        match result.output_type {
            OutputType::PrimerPairs => {
                for (index, pair) in result.best_pairs.iter().enumerate() {
                    let members = [Some(result.left_of(pair)), Some(result.right_of(pair)), result.internal_of(pair)];
                    for oligo in members.into_iter().flatten() {
                        writer.serialize(CsvRow::new(report.name, index + 1, result, oligo, options).with_pair(pair))?;
                    }
                }
            }
            OutputType::PrimerList => {
                for role in OligoRole::ALL {
                    let ranked = result.collection(role).ranked();
                    for (index, oligo) in ranked.into_iter().take(options.num_return).enumerate() {
                        writer.serialize(CsvRow::new(report.name, index + 1, result, oligo, options))?;
                    }
                }
            }
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use primerpp::core::models::oligo::OligoStatus;

    const OPTIONS: ReportOptions = ReportOptions {
        first_base_index: 1,
        num_return: 5,
    };

    fn oligo(role: OligoRole, start: usize, sequence: &str, tm: f64) -> OligoCandidate {
        let mut oligo = OligoCandidate::new(role, start, sequence.to_string());
        oligo.tm = tm;
        oligo.gc_percent = 50.0;
        oligo.self_any = Some(AlignScore(400));
        oligo.self_end = Some(AlignScore(200));
        oligo.quality = 0.25;
        oligo
    }

    fn pair_result() -> EngineResult {
        let mut result = EngineResult::new(OutputType::PrimerPairs);
        result.included_start = 10;
        result.left.oligos.push(oligo(OligoRole::Left, 5, "ACGTTGCAACGTTGCAACGT", 60.123));
        result.right.oligos.push(oligo(OligoRole::Right, 130, "TTGACCGGTTAACCGGTTGA", 59.9));
        result.left.stats.record(OligoStatus::Ok);
        result.right.stats.record(OligoStatus::Ok);
        result.best_pairs.pairs.push(PrimerPair {
            left: 0,
            right: 0,
            internal: None,
            left_start: 5,
            right_start: 130,
            internal_start: None,
            quality: 0.5,
            compl_measure: 0.0,
            diff_tm: 0.22,
            product_size: 145,
            product_size_deviation: 0,
            product_tm: 84.456,
            product_tm_oligo_tm_diff: 24.5,
            t_opt_a: 58.0,
            compl_any: Some(AlignScore(300)),
            compl_end: Some(AlignScore(100)),
            template_mispriming: None,
            repeat_similarity: None,
            repeat_name: None,
            spans_target: true,
        });
        result.best_pairs.stats.record(Ok(()));
        result
    }

    fn render_text(reports: &[Report<'_>]) -> String {
        let mut buffer = Vec::new();
        write_text(&mut buffer, reports, &OPTIONS).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn text_report_lists_pair_members_in_input_coordinates() {
        let result = pair_result();
        let text = render_text(&[Report { name: "amplicon", result: &result }]);

        assert!(text.starts_with("SEQUENCE amplicon\n"));
        assert!(text.contains("PAIR 1  quality 0.5000"));
        let left = text.lines().find(|l| l.trim_start().starts_with("LEFT PRIMER")).unwrap();
        assert!(left.contains(" 16 "), "{left}");
        assert!(left.ends_with("ACGTTGCAACGTTGCAACGT"));
        let right = text.lines().find(|l| l.trim_start().starts_with("RIGHT PRIMER")).unwrap();
        assert!(right.contains(" 160 "), "{right}");
        assert!(text.contains("PRODUCT SIZE 145, PRODUCT TM 84.46, TM DIFF 0.22, ANY COMPL 3.00, 3' COMPL 1.00"));
        assert!(text.contains("PAIR            considered 1, ok 1"));
    }

    #[test]
    fn text_report_surfaces_errors_and_empty_outcomes() {
        let mut failed = EngineResult::new(OutputType::PrimerPairs);
        failed.per_sequence_errors.push("Template sequence is empty").unwrap();
        let mut empty = EngineResult::new(OutputType::PrimerPairs);
        empty.warnings.push("No target given").unwrap();

        let text = render_text(&[
            Report { name: "broken", result: &failed },
            Report { name: "plain", result: &empty },
        ]);
        assert!(text.contains("SEQUENCE broken\nERROR: Template sequence is empty\n"));
        assert!(text.contains("WARNING: No target given"));
        assert_eq!(text.matches("NO ACCEPTABLE PAIRS FOUND").count(), 1);
    }

    #[test]
    fn primer_list_report_ranks_each_role_up_to_num_return() {
        let mut result = EngineResult::new(OutputType::PrimerList);
        for (i, quality) in [0.9, 0.1, 0.5].into_iter().enumerate() {
            let mut candidate = oligo(OligoRole::Left, i * 10, "ACGTTGCAACGTTGCAACGT", 60.0);
            candidate.quality = quality;
            result.left.oligos.push(candidate);
        }
        let options = ReportOptions {
            first_base_index: 0,
            num_return: 2,
        };
        let mut buffer = Vec::new();
        write_text(&mut buffer, &[Report { name: "list", result: &result }], &options).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let qualities: Vec<&str> = text
            .lines()
            .filter(|l| l.trim_start().starts_with("LEFT PRIMER"))
            .map(|l| l.split_whitespace().nth(8).unwrap())
            .collect();
        assert_eq!(qualities, vec!["0.100", "0.500"]);
        assert!(!text.contains("PAIR "));
    }

    #[test]
    fn csv_report_emits_one_row_per_pair_member() {
        let result = pair_result();
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[Report { name: "amplicon", result: &result }], &OPTIONS).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "sequence,rank,role,start,length,tm,gc_percent,self_any,self_end,quality,oligo,pair_quality,product_size,product_tm"
        );
        assert_eq!(lines[1], "amplicon,1,left,16,20,60.12,50.0,4.0,2.0,0.25,ACGTTGCAACGTTGCAACGT,0.5,145,84.46");
        assert!(lines[2].starts_with("amplicon,1,right,160,20,59.9,"));
    }

    #[test]
    fn csv_report_leaves_pair_columns_empty_for_oligo_lists() {
        let mut result = EngineResult::new(OutputType::PrimerList);
        result.internal.oligos.push(oligo(OligoRole::Internal, 40, "ACGTTGCAACGTTGCAACGT", 60.0));
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[Report { name: "probe", result: &result }], &OPTIONS).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with(",ACGTTGCAACGTTGCAACGT,,,"));
    }
}
