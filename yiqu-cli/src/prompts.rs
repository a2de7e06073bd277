//! Output formatting helpers shared by the commands.

use dialoguer::console::style;
use std::io::{self, Write};
use tracing::debug;

const HEADER_WIDTH: usize = 40;

/// Draws a boxed header to a writer.
pub fn print_header_to<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    let border = "─".repeat(HEADER_WIDTH);
    writeln!(w, "┌{}┐", border)?;
    writeln!(w, "│ {:<width$} │", title, width = HEADER_WIDTH - 2)?;
    writeln!(w, "└{}┘", border)?;
    Ok(())
}

/// Prints a success message with a green checkmark.
pub fn print_success(message: &str) {
    if let Err(err) = print_success_to(&mut io::stdout(), message) {
        debug!(error = %err, "writing success message");
    }
}

/// Prints a success message to a writer (for testing).
pub fn print_success_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        style("✓").green().bold(),
        style(message).green()
    )
}

/// Prints an error message to a writer.
pub fn print_error_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(w, "\n{} {}", style("✗").red().bold(), style(message).red())
}
