use super::config::Format;
use jobwatch::{ConsoleSink, ReportSink, Snapshot};
use std::io::{self, Write};

/// Writes each snapshot as one line of JSON.
#[derive(Debug)]
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ReportSink for JsonSink<W> {
    fn report(&mut self, snapshot: &Snapshot) {
        let res = serde_json::to_writer(&mut self.out, snapshot)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = res {
            tracing::warn!("Failed to write report: {e}");
        }
    }
}

/// Report sink selected by `--format`.
pub enum OutputSink<W> {
    Text(ConsoleSink<W>),
    Json(JsonSink<W>),
}

impl OutputSink<io::Stdout> {
    pub fn stdout(format: Format) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(format: Format, out: W) -> Self {
        match format {
            Format::Text => Self::Text(ConsoleSink::new(out)),
            Format::Json => Self::Json(JsonSink::new(out)),
        }
    }
}

impl<W: Write + Send> ReportSink for OutputSink<W> {
    fn report(&mut self, snapshot: &Snapshot) {
        match self {
            Self::Text(sink) => sink.report(snapshot),
            Self::Json(sink) => sink.report(snapshot),
        }
    }
}
