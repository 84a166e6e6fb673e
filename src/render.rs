//! Usage-syntax, glossary, and error-report generation.
//!
//! All three renderers are pure functions of a table: the same descriptors
//! that drive parsing drive the text, so help output cannot drift from
//! parsing behavior.

use crate::table::{ErrorLog, Opt, OptTable};

/// A reasonable default line template for [`generate_glossary`].
pub const GLOSSARY_FORMAT: &str = "  {}\n      {}\n";

/// Render the one-line usage syntax for `table`, ending with `suffix`.
///
/// Standard mode clusters optional short-only flags into one leading
/// `[-abc]` group and shows only the first form of every other entry.
/// Verbose mode lists every form `|`-joined, never clusters, and never
/// truncates repetition with an ellipsis.
pub fn generate_syntax(table: &OptTable, verbose: bool, suffix: &str) -> String {
    let mut fragments = Vec::new();

    if !verbose {
        let cluster: String = table
            .entries()
            .iter()
            .filter(|e| is_clustered(e))
            .filter_map(|e| e.shorts().first())
            .collect();
        if !cluster.is_empty() {
            fragments.push(format!("[-{cluster}]"));
        }
    }

    for opt in table.entries() {
        if opt.is_remark() || (!verbose && is_clustered(opt)) {
            continue;
        }
        let fragment = if opt.is_positional() {
            positional_fragment(opt, verbose)
        } else if verbose {
            bracketed(&verbose_forms(opt), opt.min_count() == 0)
        } else {
            bracketed(&standard_form(opt), opt.min_count() == 0)
        };
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }

    let mut out = fragments.join(" ");
    out.push_str(suffix);
    out
}

/// Entries folded into the standard-mode short-option group: optional
/// valueless flags known only by short tags.
fn is_clustered(opt: &Opt) -> bool {
    !opt.takes_value()
        && !opt.shorts().is_empty()
        && opt.longs().is_empty()
        && opt.min_count() == 0
        && !opt.is_remark()
}

fn bracketed(fragment: &str, optional: bool) -> String {
    if optional {
        format!("[{fragment}]")
    } else {
        fragment.to_string()
    }
}

/// First form only: `-s <label>` or `--name=<label>`.
fn standard_form(opt: &Opt) -> String {
    let label = opt.value_label();
    if let Some(c) = opt.shorts().first() {
        if label.is_empty() {
            format!("-{c}")
        } else {
            format!("-{c} {label}")
        }
    } else if let Some(name) = opt.longs().first() {
        if label.is_empty() {
            format!("--{name}")
        } else {
            format!("--{name}={label}")
        }
    } else {
        label.to_string()
    }
}

/// Every form, `|`-joined: `-v|--verbose <label>`.
fn verbose_forms(opt: &Opt) -> String {
    let forms: Vec<String> = opt
        .shorts()
        .iter()
        .map(|c| format!("-{c}"))
        .chain(opt.longs().iter().map(|l| format!("--{l}")))
        .collect();
    let joined = forms.join("|");
    let label = opt.value_label();
    if label.is_empty() {
        joined
    } else {
        format!("{joined} {label}")
    }
}

/// A positional entry's label, repeated per its occurrence bounds. Standard
/// mode caps literal repetitions at three and marks the rest with `...`.
fn positional_fragment(opt: &Opt, verbose: bool) -> String {
    let label = opt.value_label();
    if label.is_empty() {
        return String::new();
    }

    let min = opt.min_count();
    let max = opt.max_count();
    let mut parts = Vec::new();

    if verbose {
        for _ in 0..min {
            parts.push(label.to_string());
        }
        if max > min {
            parts.push(format!("[{label}]"));
        }
        return parts.join(" ");
    }

    let literal = min.min(3);
    for _ in 0..literal {
        parts.push(label.to_string());
    }
    let optional_shown = max > min && literal < 3;
    if optional_shown {
        parts.push(format!("[{label}]"));
    }

    let mut out = parts.join(" ");
    if min > 3 || max > min + usize::from(optional_shown) {
        out.push_str("...");
    }
    out
}

/// Render the glossary: one `line_format` substitution per entry that has
/// glossary text, with the entry's full syntax fragment and text filling the
/// template's two `{}` placeholders. Entries without text are skipped.
pub fn generate_glossary(table: &OptTable, line_format: &str) -> String {
    let mut out = String::new();
    for opt in table.entries() {
        let help = match opt.help() {
            Some(h) => h,
            None => continue,
        };
        let syntax = glossary_fragment(opt);
        out.push_str(&fill(line_format, &syntax, help));
    }
    out
}

/// All forms comma-joined plus the value label; remarks contribute only
/// their label text, with no option syntax.
fn glossary_fragment(opt: &Opt) -> String {
    if opt.is_remark() || opt.is_positional() {
        return opt.value_label().to_string();
    }
    let forms: Vec<String> = opt
        .shorts()
        .iter()
        .map(|c| format!("-{c}"))
        .chain(opt.longs().iter().map(|l| format!("--{l}")))
        .collect();
    let joined = forms.join(", ");
    let label = opt.value_label();
    if label.is_empty() {
        joined
    } else {
        format!("{joined} {label}")
    }
}

fn fill(template: &str, syntax: &str, help: &str) -> String {
    template.replacen("{}", syntax, 1).replacen("{}", help, 1)
}

/// Render the recorded parse errors, one line per error in append order,
/// each prefixed with `program_name` when given. The overflow marker renders
/// as a single fixed "too many errors" line.
pub fn generate_errors(log: &ErrorLog, program_name: Option<&str>) -> String {
    let prefix = match program_name {
        Some(name) => format!("{name}: "),
        None => String::new(),
    };
    let mut out = String::new();
    for error in log.entries() {
        out.push_str(&format!("{prefix}{error}\n"));
    }
    if log.overflowed() {
        out.push_str(&format!("{prefix}too many errors\n"));
    }
    out
}
