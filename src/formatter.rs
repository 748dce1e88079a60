//! Output formatters for query results
//!
//! Eight format identifiers over three formatter families: delimited
//! (text/csv/vbar plus header variants), box, and vertical. Delimited and
//! vertical formatters stream rows as they arrive; the box formatter buffers
//! the whole result set to compute column widths and emits everything at
//! `finish`. Formatters write to a caller-supplied sink and never close it.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::error::{CliError, Result};

/// Output format identifier
///
/// The `h`-prefixed variants behave exactly like their base format with the
/// column headers emitted as a first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Csv,
    Vbar,
    HText,
    HCsv,
    HVbar,
    Box,
    Vertical,
}

impl Format {
    /// Resolve a format name, failing on anything outside the closed set.
    ///
    /// Used both at startup and when `/format` changes the format at
    /// runtime, so an invalid name never reaches session state.
    pub fn from_name(name: &str) -> Result<Format> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "csv" => Ok(Format::Csv),
            "vbar" => Ok(Format::Vbar),
            "htext" => Ok(Format::HText),
            "hcsv" => Ok(Format::HCsv),
            "hvbar" => Ok(Format::HVbar),
            "box" => Ok(Format::Box),
            "vertical" => Ok(Format::Vertical),
            other => Err(CliError::Format(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Csv => "csv",
            Format::Vbar => "vbar",
            Format::HText => "htext",
            Format::HCsv => "hcsv",
            Format::HVbar => "hvbar",
            Format::Box => "box",
            Format::Vertical => "vertical",
        }
    }

    /// Whether this format emits a header record before data rows.
    pub fn headed(self) -> bool {
        matches!(self, Format::HText | Format::HCsv | Format::HVbar)
    }

    /// Switch the header variant on or off. Box and vertical formats have
    /// no header variant and pass through unchanged.
    pub fn with_header(self, on: bool) -> Format {
        match (self, on) {
            (Format::Text, true) => Format::HText,
            (Format::Csv, true) => Format::HCsv,
            (Format::Vbar, true) => Format::HVbar,
            (Format::HText, false) => Format::Text,
            (Format::HCsv, false) => Format::Csv,
            (Format::HVbar, false) => Format::Vbar,
            (f, _) => f,
        }
    }
}

/// Escaping discipline for one delimited format: a delimiter, an optional
/// quote character, and whether embedded delimiters are neutralized to a
/// space.
///
/// Asymmetry to be aware of: the tab format neutralizes embedded tabs, the
/// vbar format emits embedded pipes raw.
#[derive(Debug, Clone, Copy)]
pub struct FieldEscape {
    delimiter: char,
    quote: Option<char>,
    neutralize: bool,
}

impl FieldEscape {
    fn escape(&self, field: &str) -> String {
        if let Some(q) = self.quote {
            let needs_quoting = field.contains(self.delimiter)
                || field.contains(q)
                || field.contains('\n')
                || field.contains('\r');
            if needs_quoting {
                let doubled = field.replace(q, &format!("{}{}", q, q));
                return format!("{}{}{}", q, doubled, q);
            }
            return field.to_string();
        }
        if self.neutralize && field.contains(self.delimiter) {
            return field.replace(self.delimiter, " ");
        }
        field.to_string()
    }

    fn write_record<'a, I>(&self, out: &mut dyn Write, fields: I) -> io::Result<()>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                write!(out, "{}", self.delimiter)?;
            }
            first = false;
            write!(out, "{}", self.escape(field))?;
        }
        writeln!(out)
    }
}

/// A formatter instance, valid for the duration of one query.
///
/// Call order per query: `start` (skipped when the statement produced no
/// result set), `output` zero or more times, `finish` exactly once.
pub enum Formatter {
    Delimited(DelimitedFormatter),
    Boxed(BoxFormatter),
    Vertical(VerticalFormatter),
}

impl Formatter {
    pub fn new(format: Format) -> Formatter {
        match format {
            Format::Box => Formatter::Boxed(BoxFormatter::default()),
            Format::Vertical => Formatter::Vertical(VerticalFormatter::default()),
            delimited => {
                let escape = match delimited {
                    Format::Text | Format::HText => FieldEscape {
                        delimiter: '\t',
                        quote: None,
                        neutralize: true,
                    },
                    Format::Csv | Format::HCsv => FieldEscape {
                        delimiter: ',',
                        quote: Some('"'),
                        neutralize: false,
                    },
                    _ => FieldEscape {
                        delimiter: '|',
                        quote: None,
                        neutralize: false,
                    },
                };
                Formatter::Delimited(DelimitedFormatter {
                    escape,
                    headed: delimited.headed(),
                })
            },
        }
    }

    /// Begin a result set. Delivers the column headers once.
    pub fn start(&mut self, out: &mut dyn Write, headers: &[String]) -> Result<()> {
        match self {
            Formatter::Delimited(f) => f.start(out, headers),
            Formatter::Boxed(f) => f.start(headers),
            Formatter::Vertical(f) => f.start(headers),
        }
    }

    /// Emit one row. Fields are independently nullable.
    pub fn output(&mut self, out: &mut dyn Write, row: &[Option<String>]) -> Result<()> {
        match self {
            Formatter::Delimited(f) => f.output(out, row),
            Formatter::Boxed(f) => f.output(row),
            Formatter::Vertical(f) => f.output(out, row),
        }
    }

    /// End the result set, flushing anything not yet emitted.
    pub fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            Formatter::Boxed(f) => f.finish(out),
            Formatter::Delimited(_) | Formatter::Vertical(_) => Ok(()),
        }
    }
}

/// Streaming delimited output: one record per row, fields joined by the
/// format's delimiter.
pub struct DelimitedFormatter {
    escape: FieldEscape,
    headed: bool,
}

impl DelimitedFormatter {
    fn start(&mut self, out: &mut dyn Write, headers: &[String]) -> Result<()> {
        if self.headed {
            self.escape.write_record(out, headers.iter().map(|h| h.as_str()))?;
        }
        Ok(())
    }

    fn output(&mut self, out: &mut dyn Write, row: &[Option<String>]) -> Result<()> {
        self.escape
            .write_record(out, row.iter().map(|f| f.as_deref().unwrap_or("")))?;
        Ok(())
    }
}

/// Fully buffered, bordered, column-aligned output.
///
/// The slowest and most memory-hungry format: every row is held in memory
/// until `finish` so column widths can be computed over the whole result.
#[derive(Default)]
pub struct BoxFormatter {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl BoxFormatter {
    fn start(&mut self, headers: &[String]) -> Result<()> {
        self.headers = headers.iter().map(|h| normalize_newlines(h)).collect();
        self.widths = self.headers.iter().map(|h| h.chars().count()).collect();
        Ok(())
    }

    fn output(&mut self, row: &[Option<String>]) -> Result<()> {
        let cells: Vec<String> = row
            .iter()
            .map(|f| normalize_newlines(f.as_deref().unwrap_or("")))
            .collect();
        for (i, cell) in cells.iter().enumerate() {
            let width = cell.chars().count();
            if i < self.widths.len() {
                if width > self.widths[i] {
                    self.widths[i] = width;
                }
            } else {
                self.widths.push(width);
            }
        }
        self.rows.push(cells);
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        // Zero data rows: nothing at all, not even borders
        if self.rows.is_empty() {
            return Ok(());
        }

        let border = self.border_line();
        writeln!(out, "{}", border)?;
        writeln!(out, "{}", self.row_line(&self.headers))?;
        writeln!(out, "{}", border)?;
        for row in &self.rows {
            writeln!(out, "{}", self.row_line(row))?;
        }
        writeln!(out, "{}", border)?;
        Ok(())
    }

    fn border_line(&self) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "-".repeat(*w)).collect();
        format!("+-{}-+", segments.join("-+-"))
    }

    fn row_line(&self, cells: &[String]) -> String {
        let padded: Vec<String> = self
            .widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(|c| c.as_str()).unwrap_or("");
                format!("{:<width$}", cell, width = *w)
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    }
}

/// Streaming one-field-per-line output, labeled by column name.
#[derive(Default)]
pub struct VerticalFormatter {
    labels: Vec<String>,
    label_width: usize,
    row: usize,
}

impl VerticalFormatter {
    fn start(&mut self, headers: &[String]) -> Result<()> {
        self.labels = headers.to_vec();
        self.label_width = headers.iter().map(|h| h.chars().count()).max().unwrap_or(0);
        self.row = 0;
        Ok(())
    }

    fn output(&mut self, out: &mut dyn Write, row: &[Option<String>]) -> Result<()> {
        self.row += 1;
        writeln!(
            out,
            "*************************** {}. row ***************************",
            self.row
        )?;
        for (i, label) in self.labels.iter().enumerate() {
            let value = match row.get(i) {
                Some(Some(v)) => v.as_str(),
                _ => "NULL",
            };
            writeln!(out, "{:<width$}: {}", label, value, width = self.label_width)?;
        }
        Ok(())
    }
}

/// Collapse CRLF and bare CR to LF so width accounting stays honest for
/// multi-line cell contents.
fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Destination for formatted query results: stdout, or a file opened for
/// the lifetime of the sink. Diagnostics never go here.
pub enum OutputSink {
    Stdout(io::Stdout),
    File { path: PathBuf, writer: BufWriter<File> },
}

impl OutputSink {
    pub fn stdout() -> OutputSink {
        OutputSink::Stdout(io::stdout())
    }

    /// Open a sink. A missing path or `-` means standard output.
    pub fn open(path: Option<&str>) -> Result<OutputSink> {
        match path {
            None | Some("-") => Ok(OutputSink::stdout()),
            Some(p) => {
                let file = File::create(p)
                    .map_err(|e| CliError::File(format!("cannot open {}: {}", p, e)))?;
                Ok(OutputSink::File {
                    path: PathBuf::from(p),
                    writer: BufWriter::new(file),
                })
            },
        }
    }

    pub fn description(&self) -> String {
        match self {
            OutputSink::Stdout(_) => "stdout".to_string(),
            OutputSink::File { path, .. } => path.display().to_string(),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(s) => s.write(buf),
            OutputSink::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(s) => s.flush(),
            OutputSink::File { writer, .. } => writer.flush(),
        }
    }
}
