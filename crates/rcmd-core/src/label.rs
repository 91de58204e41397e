//! Host label rendering
//!
//! A label is the host address wrapped in an ANSI foreground colour, followed
//! by a colon and padded to a fixed column so output from hosts of different
//! address lengths lines up.

/// ANSI foreground colour codes, picked by `index % PALETTE.len()`
pub const PALETTE: [u8; 6] = [31, 32, 33, 34, 35, 36];

/// Column budget for the host address
pub const LABEL_WIDTH: usize = 16;

/// Resets the foreground colour only
const RESET_FG: &str = "\x1b[39m";

/// Colour code for the host at `index` in the host list
#[must_use]
pub fn label_color(index: usize) -> u8 {
    PALETTE[index % PALETTE.len()]
}

/// Render the prefix for lines coming from `host`
///
/// Returns an empty string when `show` is false. Addresses of
/// [`LABEL_WIDTH`] bytes or more get no padding.
#[must_use]
pub fn format_label(host: &str, index: usize, show: bool) -> String {
    if !show {
        return String::new();
    }

    let padding = " ".repeat(LABEL_WIDTH.saturating_sub(host.len()));
    format!("\x1b[{}m{host}:{RESET_FG}{padding}", label_color(index))
}
