//! New-chapter detection.

use std::collections::HashSet;

use crate::model::Chapter;
use crate::model::NotifiedSet;

/// Outcome of a notification diff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationDiff {
    /// Chapter ids to surface as new, in reading order.
    pub new_chapters: Vec<String>,
    /// Updated notified-set: the previous one plus `new_chapters`.
    pub notified: NotifiedSet,
}

/// Decides which chapters added by a merge are new to the user.
///
/// A chapter is new when it was just added, is not in the notified-set, is
/// ordered, and lies beyond the furthest chapter the user has progress on.
/// The very first reconciliation of a title, with no notified-set and no
/// progress, flags nothing so existing back catalogues do not flood the user.
pub fn diff(
    chapters: &[Chapter],
    added: &[String],
    notified: Option<&NotifiedSet>,
    furthest: Option<f64>,
) -> NotificationDiff {
    let mut updated = notified.cloned().unwrap_or_default();
    if notified.is_none() && furthest.is_none() {
        return NotificationDiff {
            new_chapters: Vec::new(),
            notified: updated,
        };
    }

    let added: HashSet<&str> = added.iter().map(String::as_str).collect();
    let new_chapters: Vec<String> = chapters
        .iter()
        .filter(|c| added.contains(c.href_string.as_str()))
        .filter(|c| !updated.contains(&c.href_string))
        .filter(|c| match (c.combined, furthest) {
            (Some(key), Some(limit)) => key > limit,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .map(|c| c.href_string.clone())
        .collect();

    updated.extend(new_chapters.iter().cloned());
    NotificationDiff {
        new_chapters,
        notified: updated,
    }
}
