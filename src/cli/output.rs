//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.
//! Status lines go to the command's writer, diagnostics to stderr.

use std::io::{self, Write};

use colored::Colorize;

/// Print error (red bold "Error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green "Success:" prefix)
pub fn success(out: &mut dyn Write, msg: &(impl std::fmt::Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{}: {}", "Success".green(), msg)
}

/// Print plain output (no color, for data and porcelain ids)
pub fn info(out: &mut dyn Write, msg: &(impl std::fmt::Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{}", msg)
}

/// Redraw a progress line on stderr; ends the line when done.
pub fn progress(label: &str, done: usize, total: usize) -> io::Result<()> {
    let mut stderr = io::stderr();
    write!(stderr, "\r{} {}/{}", label.cyan(), done, total)?;
    if done >= total {
        writeln!(stderr)?;
    }
    stderr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_progress_when_reaching_total_then_written_without_error() {
        assert!(progress("Testing", 1, 2).is_ok());
        assert!(progress("Testing", 2, 2).is_ok());
    }
}
