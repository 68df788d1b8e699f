// Error reporting with Ariadne
//
// Turns `Diagnostic` values into source-annotated reports.

use crate::Diagnostic;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::io;

fn build_report<'a>(
    filename: &'a str,
    diagnostic: &Diagnostic,
    color: bool,
) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
    let report = Report::build(ReportKind::Error, filename, diagnostic.span.start)
        .with_config(Config::default().with_color(color))
        .with_code(diagnostic.code.as_str())
        .with_message(diagnostic.code.title())
        .with_label(
            Label::new((filename, diagnostic.span.clone()))
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        );

    let report = diagnostic
        .labels
        .iter()
        .fold(report, |report, (span, message)| {
            report.with_label(
                Label::new((filename, span.clone()))
                    .with_message(message)
                    .with_color(Color::Yellow),
            )
        });

    let report = match &diagnostic.help {
        Some(help) => report.with_help(help),
        None => report,
    };

    report.finish()
}

/// Render diagnostics into a string (used by tests and `--emit` output)
pub fn render(
    filename: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    color: bool,
) -> io::Result<String> {
    let mut out = Vec::new();
    for diagnostic in diagnostics {
        build_report(filename, diagnostic, color)
            .write((filename, Source::from(source)), &mut out)?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Print diagnostics to stderr
pub fn report_diagnostics(
    filename: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    color: bool,
) -> io::Result<()> {
    for diagnostic in diagnostics {
        build_report(filename, diagnostic, color).eprint((filename, Source::from(source)))?;
    }
    Ok(())
}
