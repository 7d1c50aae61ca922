//! Styled status lines for the terminal report.

use console::{style, StyledObject};

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything went as planned.
    Ok,
    /// Finished, but not cleanly.
    Warn,
    /// Failed; printed to stderr.
    Error,
}

impl Status {
    fn tag(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        }
    }

    fn styled(self) -> StyledObject<&'static str> {
        let tag = style(self.tag()).bold();
        match self {
            Self::Ok => tag.green(),
            Self::Warn => tag.yellow(),
            Self::Error => tag.red(),
        }
    }
}

/// `NO_COLOR` turns styling off.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

/// Render a status line, plain or styled.
#[must_use]
pub fn status_line(status: Status, text: &str, plain: bool) -> String {
    if plain {
        format!("{} {text}", status.tag())
    } else {
        format!("{} {text}", status.styled())
    }
}

/// Render a section header, plain or styled.
#[must_use]
pub fn header_line(text: &str, plain: bool) -> String {
    let line = format!("=== {text} ===");
    if plain {
        line
    } else {
        style(line).bold().cyan().to_string()
    }
}

/// Print a section header.
pub fn print_header(text: &str) {
    println!("{}", header_line(text, is_color_disabled()));
}

/// Print a status line; errors go to stderr.
pub fn print_status(status: Status, text: &str) {
    let line = status_line(status, text, is_color_disabled());
    if status == Status::Error {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_carry_tags() {
        assert_eq!(status_line(Status::Ok, "all retired", true), "[OK] all retired");
        assert_eq!(status_line(Status::Warn, "cut short", true), "[WARN] cut short");
        assert_eq!(status_line(Status::Error, "boom", true), "[ERROR] boom");
        assert_eq!(header_line("Cartoon pool", true), "=== Cartoon pool ===");
    }

    #[test]
    fn styled_lines_keep_text() {
        assert!(status_line(Status::Warn, "cut short", false).contains("cut short"));
        assert!(header_line("Cartoon pool", false).contains("Cartoon pool"));
    }
}
