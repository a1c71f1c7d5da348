//! Colored terminal output utilities.

use console::{Style, Term};
use md2html_plugins::{PageRecord, PageStatus};

/// Terminal output formatter.
///
/// Progress and errors go to stderr; `--report` paths go to stdout so they
/// can be piped.
pub(crate) struct Output {
    term: Term,
    report: Term,
    green: Style,
    red: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            report: Term::stdout(),
            green: Style::new().green(),
            red: Style::new().red(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Announce what happened to a page, as its document asks.
    pub(crate) fn page(&self, page: &PageRecord) {
        let document = &page.document;
        let location = document.output_location();
        match page.status {
            PageStatus::Generated => {
                if document.verbose {
                    self.success(&format!("Output file generated: {location}"));
                }
                if document.report {
                    let _ = self.report.write_line(&location);
                }
            }
            PageStatus::UpToDate => {
                if document.verbose {
                    self.info(&format!(
                        "The output file is up-to-date. Skipping: {location}"
                    ));
                }
            }
        }
    }
}
