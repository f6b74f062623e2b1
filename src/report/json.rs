use std::io::Write;

use tracing::warn;

use super::{Event, Reporter};

/// Writes one JSON object per event, newline separated.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, event: &Event) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        if let Err(e) = written {
            warn!("failed to write event: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_event() {
        let mut reporter = JsonReporter::new(Vec::new());
        reporter.report(&Event::PassStarted {
            test: "t".to_string(),
            pass: 1,
        });
        reporter.report(&Event::TestCaseSkipped {
            test: "t".to_string(),
            reason: "Marked 'skip'".to_string(),
        });
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "pass-started");
        assert_eq!(lines[0]["pass"], 1);
        assert_eq!(lines[1]["reason"], "Marked 'skip'");
    }
}
