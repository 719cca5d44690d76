//! Reading progress merging.

use crate::model::Progress;
use crate::model::ProgressObservation;

/// Merges an observation into the existing progress of a chapter.
///
/// The most recent timestamp wins for `current` and `total`; an observation
/// with the same timestamp as the existing record replaces it. Derived fields
/// are always recomputed.
pub fn reconcile(
    existing: Option<&Progress>,
    chapter_id: &str,
    observation: &ProgressObservation,
) -> Progress {
    let mut merged = match existing {
        Some(prev) if prev.at > observation.at => prev.clone(),
        _ => Progress {
            current: observation.current,
            total: observation.total,
            at: observation.at,
            chapter_id: chapter_id.to_string(),
            percentage: None,
            percentage_color: None,
            new: None,
        },
    };
    merged.chapter_id = chapter_id.to_string();
    with_derived(merged)
}

/// Recomputes `percentage` and `percentage_color` from `current`/`total`.
pub fn with_derived(mut progress: Progress) -> Progress {
    progress.percentage = percentage(progress.current, progress.total);
    progress.percentage_color = progress.percentage.map(percentage_color);
    progress
}

/// `round(current / total * 100)` clamped to `[0, 100]`, unset for an
/// unknown total.
pub fn percentage(current: u32, total: u32) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let ratio = f64::from(current) / f64::from(total) * 100.0;
    Some(ratio.round().clamp(0.0, 100.0) as u8)
}

/// Maps a percentage onto a red to green hue for chapter lists.
pub fn percentage_color(percentage: u8) -> String {
    let hue = u32::from(percentage.min(100)) * 120 / 100;
    format!("hsl({hue}, 70%, 45%)")
}

/// Picks the progress shown to the user.
///
/// Confirmed progress wins unless the local record is strictly newer, so a
/// stale optimistic update never hides a newer confirmed read.
pub fn effective<'a>(
    progress: Option<&'a Progress>,
    real_progress: Option<&'a Progress>,
) -> Option<&'a Progress> {
    match (progress, real_progress) {
        (Some(local), Some(real)) => {
            if real.at >= local.at {
                Some(real)
            } else {
                Some(local)
            }
        }
        (local, None) => local,
        (None, real) => real,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(current: u32, total: u32, at: i64) -> ProgressObservation {
        ProgressObservation::new(current, total, at)
    }

    #[test]
    fn test_reconcile_without_existing() {
        let p = reconcile(None, "1-5", &obs(5, 20, 1000));
        assert_eq!(p.current, 5);
        assert_eq!(p.total, 20);
        assert_eq!(p.chapter_id, "1-5");
        assert_eq!(p.percentage, Some(25));
        assert_eq!(p.percentage_color.as_deref(), Some("hsl(30, 70%, 45%)"));
    }

    #[test]
    fn test_later_timestamp_wins() {
        let first = reconcile(None, "c", &obs(10, 20, 2000));

        let stale = reconcile(Some(&first), "c", &obs(3, 20, 1000));
        assert_eq!(stale.current, 10);
        assert_eq!(stale.at, 2000);

        let newer = reconcile(Some(&first), "c", &obs(15, 20, 3000));
        assert_eq!(newer.current, 15);
        assert_eq!(newer.percentage, Some(75));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let observation = obs(7, 9, 5000);
        let once = reconcile(None, "c", &observation);
        let twice = reconcile(Some(&once), "c", &observation);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_percentage_never_trusts_input() {
        let mut tampered = reconcile(None, "c", &obs(1, 4, 10));
        tampered.percentage = Some(99);
        let merged = reconcile(Some(&tampered), "c", &obs(0, 0, 5));
        assert_eq!(merged.percentage, Some(25));
    }

    #[test]
    fn test_percentage_edge_cases() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(5, 0), None);
        assert_eq!(percentage(0, 10), Some(0));
        assert_eq!(percentage(1, 3), Some(33));
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(30, 20), Some(100));

        let p = reconcile(None, "c", &obs(0, 0, 1));
        assert_eq!(p.percentage, None);
        assert_eq!(p.percentage_color, None);
    }

    #[test]
    fn test_effective_prefers_newer_or_equal_confirmed() {
        let local = reconcile(None, "c", &obs(4, 10, 2000));
        let old_real = reconcile(None, "c", &obs(2, 10, 1000));
        let new_real = reconcile(None, "c", &obs(8, 10, 2000));

        assert_eq!(effective(Some(&local), Some(&old_real)), Some(&local));
        assert_eq!(effective(Some(&local), Some(&new_real)), Some(&new_real));
        assert_eq!(effective(None, Some(&old_real)), Some(&old_real));
        assert_eq!(effective(Some(&local), None), Some(&local));
        assert_eq!(effective(None, None), None);
    }
}
