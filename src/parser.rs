//! The matching/parsing engine: consumes raw argument tokens against an
//! option table, filling descriptor value slots and the table's error log.

use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::table::{ErrorLog, FileName, Opt, OptTable, Storage};

/// A structured parse error, as recorded in a table's error log.
///
/// Parsing never fails as control flow; every problem becomes one of these
/// and the parse call reports only a count.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid option \"{0}\"")]
    InvalidOption(String),

    #[error("missing {label} to option {option}")]
    MissingValue { option: String, label: String },

    #[error("invalid argument \"{value}\" to option {option}")]
    BadValue { option: String, value: String },

    #[error("excess option {option}")]
    ExcessOption { option: String },

    #[error("missing option {option}")]
    MissingOption { option: String },
}

/// Perform one complete parse pass of `args` (excluding the program name)
/// against `table`, returning the number of recorded errors.
///
/// Every call first resets all occurrence counts and clears the error log,
/// so the same table can be re-parsed against alternative token sequences.
/// Value slots are only overwritten on an actual match; preset defaults in
/// unmatched slots survive.
pub fn parse_args(table: &mut OptTable, args: &[String]) -> usize {
    let (entries, log) = table.split_mut();
    for entry in entries.iter_mut() {
        entry.reset();
    }
    log.clear();

    Engine { entries, log }.run(args);
    table.errors().total()
}

struct Engine<'a> {
    entries: &'a mut [Opt],
    log: &'a mut ErrorLog,
}

impl<'a> Engine<'a> {
    fn run(&mut self, args: &[String]) {
        let mut iter = args.iter();
        let mut only_positional = false;

        while let Some(tok) = iter.next() {
            if !only_positional && tok == "--" {
                // Everything after a lone -- is positional.
                only_positional = true;
                continue;
            }

            if !only_positional && tok.starts_with("--") {
                self.match_long(tok, &mut iter);
            } else if !only_positional && tok.starts_with('-') && tok.len() > 1 {
                self.match_cluster(tok, &mut iter);
            } else {
                // Covers plain tokens and the lone "-".
                self.match_positional(tok);
            }
        }

        self.check_min_counts();
    }

    /// Match a `--name` or `--name=value` token. Long names match exactly,
    /// never by prefix; the first descriptor in table order wins.
    fn match_long(&mut self, tok: &str, iter: &mut std::slice::Iter<String>) {
        let body = &tok[2..];
        let (name, inline) = match body.find('=') {
            Some(i) => (&body[..i], Some(&body[i + 1..])),
            None => (body, None),
        };

        let found = self
            .entries
            .iter()
            .position(|e| e.longs().iter().any(|l| l == name));
        let idx = match found {
            Some(idx) => idx,
            None => {
                self.log.push(ParseError::InvalidOption(tok.to_string()));
                return;
            }
        };

        if self.entries[idx].takes_value() {
            let value = match inline {
                Some(v) => v.to_string(),
                None => match iter.next() {
                    Some(v) => v.clone(),
                    None => {
                        let opt = &self.entries[idx];
                        self.log.push(ParseError::MissingValue {
                            option: opt.display(),
                            label: error_label(opt),
                        });
                        return;
                    }
                },
            };
            self.accept(idx, &value);
        } else if inline.is_some() {
            // A value attached to a valueless option invalidates the token.
            self.log.push(ParseError::InvalidOption(tok.to_string()));
        } else {
            self.accept(idx, "");
        }
    }

    /// Match a short-option cluster such as `-abc`. Each character is
    /// matched independently; an unmatched character errors on its own and
    /// the rest of the cluster is still attempted. A value-taking character
    /// consumes the cluster remainder (`-xvalue`) or the next token.
    fn match_cluster(&mut self, tok: &str, iter: &mut std::slice::Iter<String>) {
        let chars: Vec<char> = tok[1..].chars().collect();

        for (i, c) in chars.iter().enumerate() {
            let found = self.entries.iter().position(|e| e.shorts().contains(c));
            let idx = match found {
                Some(idx) => idx,
                None => {
                    self.log.push(ParseError::InvalidOption(format!("-{c}")));
                    continue;
                }
            };

            if self.entries[idx].takes_value() {
                let rest: String = chars[i + 1..].iter().collect();
                let value = if !rest.is_empty() {
                    rest
                } else {
                    match iter.next() {
                        Some(v) => v.clone(),
                        None => {
                            let opt = &self.entries[idx];
                            self.log.push(ParseError::MissingValue {
                                option: opt.display(),
                                label: error_label(opt),
                            });
                            return;
                        }
                    }
                };
                self.accept(idx, &value);
                // The remainder of the cluster was the value.
                return;
            }

            self.accept(idx, "");
        }
    }

    /// Bind a positional token to the first positional descriptor in table
    /// order that still has a free slot.
    fn match_positional(&mut self, tok: &str) {
        let mut last = None;
        for idx in 0..self.entries.len() {
            if !self.entries[idx].is_positional() {
                continue;
            }
            last = Some(idx);
            if self.entries[idx].count() < self.entries[idx].max_count() {
                self.accept(idx, tok);
                return;
            }
        }

        // Every positional slot is taken (or the table has none).
        match last {
            Some(idx) => {
                let display = self.entries[idx].display();
                self.log.push(ParseError::ExcessOption { option: display });
            }
            None => self.log.push(ParseError::ExcessOption {
                option: format!("\"{tok}\""),
            }),
        }
    }

    /// Accept one matched value for the descriptor at `idx`: capacity check
    /// first, then kind-specific conversion, then store and count.
    fn accept(&mut self, idx: usize, raw: &str) {
        let opt = &mut self.entries[idx];
        if opt.count() >= opt.max_count() {
            let display = opt.display();
            self.log.push(ParseError::ExcessOption { option: display });
            return;
        }

        let slot = opt.count();
        let ok = match &mut opt.storage {
            Storage::Flag | Storage::Remark => true,
            Storage::Int(values) => match parse_int(raw) {
                Some(n) => {
                    values[slot] = n;
                    true
                }
                None => false,
            },
            Storage::Double(values) => match raw.trim().parse::<f64>() {
                Ok(d) => {
                    values[slot] = d;
                    true
                }
                Err(_) => false,
            },
            Storage::Str(values) => {
                values[slot] = raw.to_string();
                true
            }
            Storage::Regex { pattern, values } => {
                if pattern.is_match(raw) {
                    values[slot] = raw.to_string();
                    true
                } else {
                    false
                }
            }
            Storage::File(values) => {
                values[slot] = FileName::split(raw);
                true
            }
            Storage::Date { format, values } => match parse_date(format, raw) {
                Some(d) => {
                    values[slot] = d;
                    true
                }
                None => false,
            },
        };

        if ok {
            opt.bump();
        } else {
            let display = opt.display();
            self.log.push(ParseError::BadValue {
                option: display,
                value: raw.to_string(),
            });
        }
    }

    fn check_min_counts(&mut self) {
        for idx in 0..self.entries.len() {
            let entry = &self.entries[idx];
            if entry.matches_tokens() && entry.count() < entry.min_count() {
                let display = entry.display();
                self.log.push(ParseError::MissingOption { option: display });
            }
        }
    }
}

/// The label used in "missing ... to option" messages.
fn error_label(opt: &Opt) -> String {
    let label = opt.value_label();
    if label.is_empty() {
        "value".to_string()
    } else {
        label.to_string()
    }
}

/// Parse an integer token: decimal, `0x`/`0o`/`0b` prefixed (case
/// insensitive), optional sign, and `KB`/`MB`/`GB` magnitude suffixes.
fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let lower = s.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    let split = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let (number, suffix) = digits.split_at(split);
    if number.is_empty() {
        return None;
    }

    let mut value = i64::from_str_radix(number, radix).ok()?;
    let scale: i64 = match suffix {
        "" => 1,
        "kb" => 1024,
        "mb" => 1024 * 1024,
        "gb" => 1024 * 1024 * 1024,
        _ => return None,
    };
    value = value.checked_mul(scale)?;
    if negative {
        value = value.checked_neg()?;
    }
    Some(value)
}

/// Parse a date token against a strftime format. A format without time
/// fields yields midnight.
fn parse_date(format: &str, raw: &str) -> Option<NaiveDateTime> {
    use chrono::format::{parse, Parsed, StrftimeItems};

    let mut parsed = Parsed::new();
    parse(&mut parsed, raw.trim(), StrftimeItems::new(format)).ok()?;
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}
