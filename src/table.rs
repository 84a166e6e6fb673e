//! Option descriptors, the option table, and the bounded error log.

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

use crate::parser::ParseError;

/// Default capacity of a table's error log.
pub const DEFAULT_ERROR_LIMIT: usize = 20;

/// Errors that can occur while constructing an option descriptor.
#[derive(Debug, Error)]
pub enum OptError {
    #[error("invalid occurrence bounds min={min} max={max}: max must be >= 1 and >= min")]
    BadBounds { min: usize, max: usize },

    #[error("invalid short option '{0}': must be a single ASCII letter or digit")]
    BadShort(char),

    #[error("invalid long option \"{0}\"")]
    BadLong(String),

    #[error("invalid pattern \"{pattern}\": {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// A filename value split into its full form, basename, and extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileName {
    /// The filename exactly as given on the command line.
    pub full: String,
    /// The component after the last path separator.
    pub base: String,
    /// The extension of the basename, including the leading dot; empty if none.
    pub ext: String,
}

impl FileName {
    pub(crate) fn split(raw: &str) -> FileName {
        let base = raw.rsplit('/').next().unwrap_or(raw);
        let ext = match base.rfind('.') {
            // A leading dot (hidden file) is not an extension.
            Some(i) if i > 0 => &base[i..],
            _ => "",
        };
        FileName {
            full: raw.to_string(),
            base: base.to_string(),
            ext: ext.to_string(),
        }
    }
}

/// Per-kind value storage. Value vectors are allocated to `max_count` slots
/// up front; `Opt::count` says how many slots a parse actually filled.
#[derive(Debug, Clone)]
pub(crate) enum Storage {
    Flag,
    Remark,
    Int(Vec<i64>),
    Double(Vec<f64>),
    Str(Vec<String>),
    Regex { pattern: Regex, values: Vec<String> },
    File(Vec<FileName>),
    Date { format: String, values: Vec<NaiveDateTime> },
}

/// One configured command-line option: its forms, occurrence bounds, and
/// typed value storage.
#[derive(Debug, Clone)]
pub struct Opt {
    shorts: Vec<char>,
    longs: Vec<String>,
    /// `None` means "use the kind default"; `Some("")` suppresses the label.
    label: Option<String>,
    help: Option<String>,
    min: usize,
    max: usize,
    count: usize,
    pub(crate) storage: Storage,
}

fn parse_shorts(shorts: &str) -> Result<Vec<char>, OptError> {
    let mut out = Vec::new();
    for c in shorts.chars() {
        if !c.is_ascii_alphanumeric() {
            return Err(OptError::BadShort(c));
        }
        out.push(c);
    }
    Ok(out)
}

fn parse_longs(longs: &str) -> Result<Vec<String>, OptError> {
    let mut out = Vec::new();
    if longs.is_empty() {
        return Ok(out);
    }
    for name in longs.split(',') {
        if name.is_empty()
            || name.starts_with('-')
            || name.contains('=')
            || name.contains(char::is_whitespace)
        {
            return Err(OptError::BadLong(name.to_string()));
        }
        out.push(name.to_string());
    }
    Ok(out)
}

impl Opt {
    fn new(
        shorts: &str,
        longs: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
        storage: Storage,
    ) -> Result<Opt, OptError> {
        if max < 1 || max < min {
            return Err(OptError::BadBounds { min, max });
        }
        Ok(Opt {
            shorts: parse_shorts(shorts)?,
            longs: parse_longs(longs)?,
            label: label.map(|s| s.to_string()),
            help: help.map(|s| s.to_string()),
            min,
            max,
            count: 0,
            storage,
        })
    }

    /// A literal flag: matched by tag, carries no value.
    pub fn flag(
        shorts: &str,
        longs: &str,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        Opt::new(shorts, longs, None, min, max, help, Storage::Flag)
    }

    /// An integer option. Accepts decimal, `0x`/`0o`/`0b` prefixed forms,
    /// and `KB`/`MB`/`GB` magnitude suffixes.
    pub fn int(
        shorts: &str,
        longs: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let storage = Storage::Int(vec![0; max]);
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A double-precision option accepting standard decimal or exponential
    /// notation.
    pub fn double(
        shorts: &str,
        longs: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let storage = Storage::Double(vec![0.0; max]);
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A free-form string option.
    pub fn string(
        shorts: &str,
        longs: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let storage = Storage::Str(vec![String::new(); max]);
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A string option whose values must match `pattern`.
    pub fn regex(
        shorts: &str,
        longs: &str,
        pattern: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let compiled = Regex::new(pattern).map_err(|source| OptError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let storage = Storage::Regex {
            pattern: compiled,
            values: vec![String::new(); max],
        };
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A filename option; values are split into basename and extension on
    /// acceptance.
    pub fn file(
        shorts: &str,
        longs: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let storage = Storage::File(vec![FileName::default(); max]);
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A date option parsed against a strftime-style `format`. Missing time
    /// fields default to midnight.
    pub fn date(
        shorts: &str,
        longs: &str,
        format: &str,
        label: Option<&str>,
        min: usize,
        max: usize,
        help: Option<&str>,
    ) -> Result<Opt, OptError> {
        let storage = Storage::Date {
            format: format.to_string(),
            values: vec![NaiveDateTime::UNIX_EPOCH; max],
        };
        Opt::new(shorts, longs, label, min, max, help, storage)
    }

    /// A free-text remark: never matches anything, only contributes a line
    /// to the glossary.
    pub fn remark(label: &str, help: &str) -> Result<Opt, OptError> {
        Ok(Opt {
            shorts: Vec::new(),
            longs: Vec::new(),
            label: Some(label.to_string()),
            help: Some(help.to_string()),
            min: 0,
            max: 1,
            count: 0,
            storage: Storage::Remark,
        })
    }

    pub fn shorts(&self) -> &[char] {
        &self.shorts
    }

    pub fn longs(&self) -> &[String] {
        &self.longs
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn min_count(&self) -> usize {
        self.min
    }

    pub fn max_count(&self) -> usize {
        self.max
    }

    /// How many times this option matched during the last parse.
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when this entry is matched by position rather than by tag.
    /// Remarks have no tags either but never match.
    pub fn is_positional(&self) -> bool {
        self.shorts.is_empty() && self.longs.is_empty() && self.matches_tokens()
    }

    pub(crate) fn matches_tokens(&self) -> bool {
        !matches!(self.storage, Storage::Remark)
    }

    /// True when a match must be followed by a value token.
    pub fn takes_value(&self) -> bool {
        !matches!(self.storage, Storage::Flag | Storage::Remark)
    }

    pub(crate) fn is_remark(&self) -> bool {
        matches!(self.storage, Storage::Remark)
    }

    fn default_label(&self) -> &str {
        match &self.storage {
            Storage::Flag | Storage::Remark => "",
            Storage::Int(_) => "<int>",
            Storage::Double(_) => "<double>",
            Storage::Str(_) => "<string>",
            Storage::Regex { pattern, .. } => pattern.as_str(),
            Storage::File(_) => "<file>",
            Storage::Date { format, .. } => format,
        }
    }

    /// The display label for this entry's value: the explicit label if one
    /// was given (the empty string suppresses it), otherwise the kind default.
    pub fn value_label(&self) -> &str {
        match &self.label {
            Some(l) => l,
            None => self.default_label(),
        }
    }

    /// All forms joined with `|`, followed by the value label: the way this
    /// option is named in error messages.
    pub fn display(&self) -> String {
        let forms: Vec<String> = self
            .shorts
            .iter()
            .map(|c| format!("-{c}"))
            .chain(self.longs.iter().map(|l| format!("--{l}")))
            .collect();
        let label = self.value_label();
        if forms.is_empty() {
            return label.to_string();
        }
        let joined = forms.join("|");
        if label.is_empty() {
            joined
        } else {
            format!("{joined} {label}")
        }
    }

    /// Converted integer values; empty for other kinds. Slots at index
    /// `count()` and beyond hold defaults, which callers may preset via
    /// [`Opt::ints_mut`] before parsing.
    pub fn ints(&self) -> &[i64] {
        match &self.storage {
            Storage::Int(v) => v,
            _ => &[],
        }
    }

    pub fn ints_mut(&mut self) -> &mut [i64] {
        match &mut self.storage {
            Storage::Int(v) => v,
            _ => &mut [],
        }
    }

    /// Converted double values; empty for other kinds.
    pub fn doubles(&self) -> &[f64] {
        match &self.storage {
            Storage::Double(v) => v,
            _ => &[],
        }
    }

    pub fn doubles_mut(&mut self) -> &mut [f64] {
        match &mut self.storage {
            Storage::Double(v) => v,
            _ => &mut [],
        }
    }

    /// String values, for both the plain string and regex kinds.
    pub fn strings(&self) -> &[String] {
        match &self.storage {
            Storage::Str(v) | Storage::Regex { values: v, .. } => v,
            _ => &[],
        }
    }

    pub fn strings_mut(&mut self) -> &mut [String] {
        match &mut self.storage {
            Storage::Str(v) | Storage::Regex { values: v, .. } => v,
            _ => &mut [],
        }
    }

    /// Filename values; empty for other kinds.
    pub fn files(&self) -> &[FileName] {
        match &self.storage {
            Storage::File(v) => v,
            _ => &[],
        }
    }

    /// Parsed date values; empty for other kinds.
    pub fn dates(&self) -> &[NaiveDateTime] {
        match &self.storage {
            Storage::Date { values, .. } => values,
            _ => &[],
        }
    }

    /// The strftime format of a date entry.
    pub fn date_format(&self) -> Option<&str> {
        match &self.storage {
            Storage::Date { format, .. } => Some(format),
            _ => None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }

    pub(crate) fn bump(&mut self) {
        self.count += 1;
    }
}

/// The table's error sentinel: a bounded, ordered list of parse errors.
///
/// Once `capacity` structured errors have been recorded, further errors are
/// coalesced into a single overflow marker.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    capacity: usize,
    errors: Vec<ParseError>,
    overflow: bool,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> ErrorLog {
        ErrorLog {
            capacity,
            errors: Vec::new(),
            overflow: false,
        }
    }

    pub(crate) fn push(&mut self, error: ParseError) {
        if self.errors.len() < self.capacity {
            self.errors.push(error);
        } else {
            self.overflow = true;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.errors.clear();
        self.overflow = false;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The structured errors recorded so far, in append order.
    pub fn entries(&self) -> &[ParseError] {
        &self.errors
    }

    /// True when at least one error was dropped for lack of capacity.
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    /// Structured errors plus the overflow marker, if set.
    pub fn total(&self) -> usize {
        self.errors.len() + usize::from(self.overflow)
    }
}

/// An ordered collection of option descriptors plus the error log that
/// terminates it. The unit of configuration, parsing, and rendering.
///
/// A table owns its descriptors: dropping it releases everything in one
/// sweep. Use [`OptTable::into_entries`] to transfer descriptor ownership
/// out instead.
#[derive(Debug, Clone)]
pub struct OptTable {
    entries: Vec<Opt>,
    errors: ErrorLog,
}

impl OptTable {
    pub fn new(entries: Vec<Opt>, error_limit: usize) -> OptTable {
        OptTable {
            entries,
            errors: ErrorLog::new(error_limit),
        }
    }

    pub fn builder() -> TableBuilder {
        TableBuilder {
            entries: Vec::new(),
            error_limit: DEFAULT_ERROR_LIMIT,
            failure: None,
        }
    }

    pub fn entries(&self) -> &[Opt] {
        &self.entries
    }

    /// Mutable access to the descriptors, for presetting default values
    /// before a parse.
    pub fn entries_mut(&mut self) -> &mut [Opt] {
        &mut self.entries
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Run one complete parse pass over `args` (excluding the program name).
    /// Returns the number of recorded errors; see [`crate::parse_args`].
    pub fn parse(&mut self, args: &[String]) -> usize {
        crate::parser::parse_args(self, args)
    }

    /// Consume the table, handing ownership of the descriptors (and their
    /// value storage) to the caller.
    pub fn into_entries(self) -> Vec<Opt> {
        self.entries
    }

    pub(crate) fn split_mut(&mut self) -> (&mut [Opt], &mut ErrorLog) {
        (&mut self.entries, &mut self.errors)
    }
}

/// Collects per-constructor results and surfaces the first failure at
/// [`TableBuilder::build`], so a whole table can be assembled and checked in
/// one step.
#[derive(Debug)]
pub struct TableBuilder {
    entries: Vec<Opt>,
    error_limit: usize,
    failure: Option<OptError>,
}

impl TableBuilder {
    pub fn push(mut self, entry: Result<Opt, OptError>) -> TableBuilder {
        match entry {
            Ok(opt) => self.entries.push(opt),
            Err(e) => {
                if self.failure.is_none() {
                    self.failure = Some(e);
                }
            }
        }
        self
    }

    /// Capacity of the table's error log (default: [`DEFAULT_ERROR_LIMIT`]).
    pub fn error_limit(mut self, limit: usize) -> TableBuilder {
        self.error_limit = limit;
        self
    }

    pub fn build(self) -> Result<OptTable, OptError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(OptTable::new(self.entries, self.error_limit)),
        }
    }
}
