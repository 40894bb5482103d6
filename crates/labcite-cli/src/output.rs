//! Terminal output for the run summary and report.

use std::io::Write;

use owo_colors::OwoColorize;

use labcite_core::pipeline::RunStats;
use labcite_core::record::Record;
use labcite_core::report::RunReport;

#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub fn print_stats(writer: &mut impl Write, stats: &RunStats) -> std::io::Result<()> {
    writeln!(
        writer,
        "{} source(s) compiled, {} after merging",
        stats.sources, stats.merged
    )?;
    writeln!(
        writer,
        "{} citation(s) generated, {} preprint duplicate(s) removed",
        stats.citations, stats.preprints_removed
    )?;
    Ok(())
}

/// List the compiled and merged source records (dry run).
pub fn print_sources(
    writer: &mut impl Write,
    records: &[Record],
    color: ColorMode,
) -> std::io::Result<()> {
    for (index, record) in records.iter().enumerate() {
        if color.enabled() {
            writeln!(writer, "{}", format!("[{}]", index + 1).bold().yellow())?;
        } else {
            writeln!(writer, "[{}]", index + 1)?;
        }
        writeln!(writer, "  Source:  {}", record.source.label())?;
        writeln!(
            writer,
            "  Origin:  {} ({})",
            record.provenance.origin.plugin_name(),
            record.provenance.file
        )?;
        writeln!(writer)?;
    }
    writeln!(writer, "Total: {} source(s)", records.len())?;
    Ok(())
}

/// Print every accumulated warning and error, so the whole run's problems are
/// visible in one place.
pub fn print_report(
    writer: &mut impl Write,
    report: &RunReport,
    color: ColorMode,
) -> std::io::Result<()> {
    if !report.warnings().is_empty() {
        let heading = format!("{} warning(s) occurred above", report.warnings().len());
        if color.enabled() {
            writeln!(writer, "{}", heading.yellow())?;
        } else {
            writeln!(writer, "{}", heading)?;
        }
        for warning in report.warnings() {
            writeln!(writer, "  {}", warning)?;
        }
    }

    if report.has_errors() {
        let heading = format!("{} error(s) occurred above", report.errors().len());
        if color.enabled() {
            writeln!(writer, "{}", heading.red())?;
        } else {
            writeln!(writer, "{}", heading)?;
        }
        for error in report.errors() {
            writeln!(writer, "  {}", error)?;
        }
    } else if color.enabled() {
        writeln!(writer, "{}", "All done!".green())?;
    } else {
        writeln!(writer, "All done!")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_output_lists_warnings_and_errors() {
        let mut report = RunReport::new();
        report.warn("a soft problem");
        report.error("a hard problem");

        let mut buffer = Vec::new();
        print_report(&mut buffer, &report, ColorMode(false)).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("1 warning(s) occurred above"));
        assert!(text.contains("a soft problem"));
        assert!(text.contains("1 error(s) occurred above"));
        assert!(text.contains("a hard problem"));
        assert!(!text.contains("All done!"));
    }

    #[test]
    fn clean_report_prints_success() {
        let mut buffer = Vec::new();
        print_report(&mut buffer, &RunReport::new(), ColorMode(false)).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("All done!"));
    }
}
