//! Rendering of the log read-back

use serde::Serialize;

/// Print the read-back exactly as stored, one line per line
pub(crate) fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// Last `n` lines, or all of them
pub(crate) fn tail(lines: &[String], n: Option<usize>) -> &[String] {
    match n {
        Some(n) if n < lines.len() => &lines[lines.len() - n..],
        _ => lines,
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to render JSON: {e}");
            std::process::exit(1);
        }
    }
}
