use clap::ValueEnum;

use crate::formats::BookRecord;
use crate::position::{self, Position, Unit};

const MIN_CHAPTERS: u64 = 20;
const MIN_PAGES: u64 = 300;
const CHAPTER_FACTOR: u64 = 2;
const PAGE_FACTOR: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Prev,
    Next,
}

/// Estimated total length for a book whose reader is at `position`, in the
/// same unit (e.g. `20 chapters`, `753 pages`). Book length is never asked
/// for; the estimate only grows as the reader moves forward.
#[must_use]
pub fn estimate_total(position: &str) -> String {
    let marker = position::first_number(position).unwrap_or(1);
    let unit = Unit::of(position);
    let total = match unit {
        Unit::Chapter => marker.saturating_mul(CHAPTER_FACTOR).max(MIN_CHAPTERS),
        Unit::Page => marker.saturating_mul(PAGE_FACTOR).max(MIN_PAGES),
    };
    format!("{total} {}", unit.plural())
}

/// Percentage of `total` reached at `current`, rounded half up and capped at
/// 100. A zero total reads as finished unless the current marker is zero too.
#[must_use]
pub fn calculate_progress(current: &str, total: &str) -> u32 {
    let current = u128::from(position::first_number(current).unwrap_or(0));
    let total = u128::from(position::first_number(total).unwrap_or(1));

    if total == 0 {
        return if current == 0 { 0 } else { 100 };
    }

    let rounded = (current * 200 + total) / (total * 2);
    rounded.min(100) as u32
}

/// True once `marker` passes 80% of `total_marker`.
fn needs_reestimate(marker: u64, total_marker: u64) -> bool {
    u128::from(marker) * 5 > u128::from(total_marker) * 4
}

/// Moves the reader one step. The unit never changes; `Prev` floors at 1 and
/// `Next` re-estimates the total when the reader nears the end of it.
#[must_use]
pub fn advance(record: &BookRecord, direction: Direction) -> BookRecord {
    let current = position::parse(&record.current_position);
    let mut marker = current.marker;
    let mut estimated_total = record.estimated_total.clone();

    match direction {
        Direction::Prev => {
            if marker > 1 {
                marker -= 1;
            }
        }
        Direction::Next => {
            marker = marker.saturating_add(1);
            let total_marker = position::first_number(&estimated_total).unwrap_or(1);
            if needs_reestimate(marker, total_marker) {
                let synthetic = Position::new(marker, current.unit).to_string();
                estimated_total = estimate_total(&synthetic);
            }
        }
    }

    let current_position = Position::new(marker, current.unit).to_string();
    let progress = calculate_progress(&current_position, &estimated_total);

    BookRecord {
        current_position,
        estimated_total,
        progress,
        ..record.clone()
    }
}
