//! Output file naming and the reverse mapping used for idempotent re-runs.
//!
//! A refined document is named
//! `<marker><backend_short>_<base_name>_<YYYYmmdd>_<HHMMSS>.txt`.

use chrono::Local;
use std::path::Path;

/// Timestamp format shared by every generated file.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Local timestamp for output names.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Source file name without its extension.
pub fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Name of the refined document for one item.
pub fn output_file_name(marker: &str, short_name: &str, file_name: &str, ts: &str) -> String {
    format!("{marker}{short_name}_{}_{ts}.txt", base_name(file_name))
}

/// Name of the run report.
pub fn report_file_name(ts: &str, extension: &str) -> String {
    format!("batch_refining_report_{ts}.{extension}")
}

/// Name of the JSON Lines results log.
pub fn results_log_name(ts: &str) -> String {
    format!("batch_results_{ts}.jsonl")
}

/// Recover the source file name from a refined output name.
///
/// Refined documents always end in `.txt`; the recovered source name takes
/// the input `extension`.
///
/// Strips the marker, then the longest matching known short name, then the
/// trailing `_<date>_<time>`. Names with an unknown backend fall back to
/// positional decomposition: drop the first two `_` fields and the last one.
pub fn parse_output_name(
    output_name: &str,
    marker: &str,
    extension: &str,
    short_names: &[String],
) -> Option<String> {
    let suffix = format!(".{extension}");
    let stem = output_name.strip_prefix(marker)?.strip_suffix(".txt")?;

    let mut known: Vec<&str> = short_names.iter().map(String::as_str).collect();
    known.sort_by_key(|s| std::cmp::Reverse(s.len()));

    for short in known {
        let Some(rest) = stem
            .strip_prefix(short)
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        if let Some(base) = strip_timestamp(rest) {
            return Some(format!("{base}{suffix}"));
        }
    }

    positional_base(output_name, &suffix)
}

fn strip_timestamp(rest: &str) -> Option<&str> {
    let (head, time) = rest.rsplit_once('_')?;
    let (base, date) = head.rsplit_once('_')?;
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    if base.is_empty() || !digits(date, 8) || !digits(time, 6) {
        return None;
    }
    Some(base)
}

fn positional_base(output_name: &str, suffix: &str) -> Option<String> {
    let parts: Vec<&str> = output_name.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    let joined = parts[2..].join("_").replace(".txt", "");
    let base = joined.rsplit_once('_').map_or(joined.as_str(), |(b, _)| b);
    Some(format!("{base}{suffix}"))
}
