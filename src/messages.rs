//! Display message set and 16-column line helpers.
//!
//! Every screen the kiosk shows is built from these strings.  Lines are
//! fixed-capacity [`DisplayLine`]s; anything wider than the panel is cut
//! at the last character that fits.

use core::fmt::{self, Write};

use crate::pins::LCD_COLS;

/// One row of the character display.
pub type DisplayLine = heapless::String<LCD_COLS>;

pub const WELCOME_L1: &str = "   ECO-RVM";
pub const WELCOME_L2: &str = " Present card";
pub const USER_FOUND_L1: &str = "User:";
pub const INSERT_OBJECT_L2: &str = "Insert object";
pub const ANALYZING_L1: &str = "Analyzing...";
pub const PLEASE_WAIT_L2: &str = "Please wait";
pub const ACCEPTED_L1: &str = "ACCEPTED!";
pub const REJECTED_L1: &str = "REJECTED";
pub const TRY_AGAIN_L2: &str = "Try again";
pub const USER_NOT_FOUND_L1: &str = "Not registered";
pub const TIMEOUT_L1: &str = "Timed out";

/// Copy `text` into a display line, dropping whatever does not fit.
pub fn line(text: &str) -> DisplayLine {
    let mut out = DisplayLine::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Format into a display line, truncating at the panel width.
pub fn line_fmt(args: fmt::Arguments<'_>) -> DisplayLine {
    let mut out = Truncating(DisplayLine::new());
    // Truncating never reports an error.
    let _ = out.write_fmt(args);
    out.0
}

/// `+N points` for the accepted screen.
pub fn points_line(points: u16) -> DisplayLine {
    line_fmt(format_args!("+{} points", points))
}

/// `User:<who>` for the screens shown once a card is known.
pub fn user_line(who: &str) -> DisplayLine {
    line_fmt(format_args!("{}{}", USER_FOUND_L1, who))
}

struct Truncating(DisplayLine);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_messages_fit_the_panel() {
        for msg in [
            WELCOME_L1,
            WELCOME_L2,
            INSERT_OBJECT_L2,
            ANALYZING_L1,
            PLEASE_WAIT_L2,
            ACCEPTED_L1,
            REJECTED_L1,
            TRY_AGAIN_L2,
            USER_NOT_FOUND_L1,
            TIMEOUT_L1,
        ] {
            assert!(msg.chars().count() <= LCD_COLS, "{msg:?} overflows the panel");
        }
    }

    #[test]
    fn long_text_is_truncated() {
        let l = line("0123456789ABCDEFGHIJ");
        assert_eq!(l.as_str(), "0123456789ABCDEF");
    }

    #[test]
    fn formatted_lines_truncate_instead_of_failing() {
        assert_eq!(points_line(10).as_str(), "+10 points");
        assert_eq!(user_line("Maria Fernanda Lopez").as_str(), "User:Maria Ferna");
    }
}
