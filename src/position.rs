use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Chapter,
    Page,
}

impl Unit {
    pub fn of(text: &str) -> Self {
        if text.to_lowercase().contains("chapter") {
            Self::Chapter
        } else {
            Self::Page
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Chapter => "Chapter",
            Self::Page => "Page",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Chapter => "chapters",
            Self::Page => "pages",
        }
    }
}

/// The first number in a free-text position ("Chapter 12", "p. 150") and
/// whether it counts chapters or pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub marker: u64,
    pub unit: Unit,
}

impl Position {
    pub fn new(marker: u64, unit: Unit) -> Self {
        Self { marker, unit }
    }
}

/// Canonical position text, e.g. `Chapter 12`.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.unit.label(), self.marker)
    }
}

/// Never fails: text without digits parses as marker 0.
#[must_use]
pub fn parse(text: &str) -> Position {
    Position {
        marker: first_number(text).unwrap_or(0),
        unit: Unit::of(text),
    }
}

/// First run of ASCII digits in `text`. Runs that overflow `u64` saturate.
pub fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}
