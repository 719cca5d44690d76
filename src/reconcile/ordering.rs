//! Chapter ordering.
//!
//! Every orderable chapter gets a `combined` key such that ascending keys
//! follow natural reading order: `season * 100_000 + chapter`.
//!
//! Chapters without a number (specials, extras) are placed right after the
//! nearest preceding numbered chapter in reading order. The n-th special in a
//! run gets `anchor + n * 0.001`, where the anchor is the preceding numbered
//! chapter's key, or `season * 100_000` when nothing precedes it. Runs too
//! long to fit before the next numbered chapter use a smaller step. Reading
//! order of a scrape is inferred from its numbered chapters: providers that
//! list newest first are walked back to front.

use std::cmp::Ordering;

use crate::model::Chapter;

/// Multiplier separating seasons. Chapter numbers must stay below it.
pub const SEASON_FACTOR: f64 = 100_000.0;
/// Distance between consecutive specials sharing an anchor.
pub const SPECIAL_STEP: f64 = 0.001;

/// Why a chapter could not be ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnomalyReason {
    #[error("season is negative")]
    NegativeSeason,
    #[error("chapter number is negative")]
    NegativeChapter,
    #[error("chapter number is not finite")]
    NonFiniteChapter,
    #[error("chapter number overflows into the season component")]
    ChapterOutOfRange,
}

/// A chapter that is stored but excluded from ordering-dependent operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("chapter `{href_string}` ({label}) cannot be ordered: {reason}")]
pub struct OrderingAnomaly {
    pub href_string: String,
    pub label: String,
    pub reason: AnomalyReason,
}

impl OrderingAnomaly {
    fn new(chapter: &Chapter, reason: AnomalyReason) -> Self {
        Self {
            href_string: chapter.href_string.clone(),
            label: chapter.label.clone(),
            reason,
        }
    }
}

/// Computes the combined key of a numbered chapter.
pub fn combined_key(season: i32, chapter: f64) -> Result<f64, AnomalyReason> {
    if season < 0 {
        return Err(AnomalyReason::NegativeSeason);
    }
    if !chapter.is_finite() {
        return Err(AnomalyReason::NonFiniteChapter);
    }
    if chapter < 0.0 {
        return Err(AnomalyReason::NegativeChapter);
    }
    if chapter >= SEASON_FACTOR {
        return Err(AnomalyReason::ChapterOutOfRange);
    }
    Ok(f64::from(season) * SEASON_FACTOR + chapter)
}

enum Slot {
    Numbered(f64),
    Special,
    Invalid,
}

/// Assigns `combined` to every chapter in scrape order and reports the
/// chapters that could not be ordered. Those get `combined = None`.
pub fn normalize(chapters: &mut [Chapter]) -> Vec<OrderingAnomaly> {
    let mut anomalies = Vec::new();
    let slots: Vec<Slot> = chapters
        .iter()
        .map(|chapter| {
            let result = match chapter.chapter {
                Some(number) => combined_key(chapter.season, number).map(Slot::Numbered),
                None if chapter.season < 0 => Err(AnomalyReason::NegativeSeason),
                None => Ok(Slot::Special),
            };
            result.unwrap_or_else(|reason| {
                anomalies.push(OrderingAnomaly::new(chapter, reason));
                Slot::Invalid
            })
        })
        .collect();

    let mut order: Vec<usize> = (0..chapters.len()).collect();
    if is_newest_first(&slots) {
        order.reverse();
    }

    let mut anchor: Option<f64> = None;
    let mut run = 0u32;
    let mut step = SPECIAL_STEP;
    for (pos, &idx) in order.iter().enumerate() {
        chapters[idx].combined = match slots[idx] {
            Slot::Numbered(key) => {
                anchor = Some(key);
                run = 0;
                Some(key)
            }
            Slot::Special => {
                let base =
                    anchor.unwrap_or_else(|| f64::from(chapters[idx].season) * SEASON_FACTOR);
                if run == 0 {
                    step = special_step(&slots, &order[pos..], base);
                }
                run += 1;
                Some(base + f64::from(run) * step)
            }
            Slot::Invalid => None,
        };
    }

    anomalies
}

/// Step for the run of specials starting at `rest[0]`. Long runs are
/// squeezed so they stay below the next numbered chapter.
fn special_step(slots: &[Slot], rest: &[usize], base: f64) -> f64 {
    let mut run_len = 0u32;
    let mut next = None;
    for &idx in rest {
        match slots[idx] {
            Slot::Special => run_len += 1,
            Slot::Numbered(key) => {
                next = Some(key);
                break;
            }
            Slot::Invalid => {}
        }
    }
    match next {
        Some(next) if next > base => SPECIAL_STEP.min((next - base) / f64::from(run_len + 1)),
        _ => SPECIAL_STEP,
    }
}

fn is_newest_first(slots: &[Slot]) -> bool {
    let mut keys = slots.iter().filter_map(|s| match s {
        Slot::Numbered(key) => Some(*key),
        _ => None,
    });
    match (keys.next(), keys.next_back()) {
        (Some(first), Some(last)) => first > last,
        _ => false,
    }
}

/// Orders chapters by ascending key. Unordered chapters go last, keeping
/// their relative order.
pub fn compare(a: &Chapter, b: &Chapter) -> Ordering {
    match (a.combined, b.combined) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(compare);
}
