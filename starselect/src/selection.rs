//! Ranking of scored candidates.
//!
//! Candidates are sorted by descending preference with a stable sort, so
//! equal scores keep their catalog order. Priorities (1-based) are handed out
//! to the accepted candidates in that order.

use crate::candidate::{Candidate, REJECT_PREFERENCE};
use std::cmp::Ordering;

/// A candidate after ranking, with its priority if it was selected.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStar {
    pub star: Candidate,
    pub priority: Option<usize>,
}

/// Result of a selection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Every candidate in ranked order.
    pub ranked: Vec<RankedStar>,
    /// Number of stars handed to the guider.
    pub candidate_count: usize,
    /// How many of the leading stars are recommended.
    pub preferred_count: usize,
}

impl Selection {
    /// Selected stars in priority order.
    pub fn selected(&self) -> impl Iterator<Item = (&Candidate, usize)> {
        self.ranked
            .iter()
            .filter_map(|ranked| ranked.priority.map(|p| (&ranked.star, p)))
    }
}

/// Descending preference. Total over all f64 values, equal scores compare equal.
fn by_preference(a: &Candidate, b: &Candidate) -> Ordering {
    b.pref.total_cmp(&a.pref)
}

/// Stable sort by descending preference.
pub fn sort_by_preference(stars: &mut [Candidate]) {
    stars.sort_by(by_preference);
}

/// Full tool selection.
///
/// Stars fainter than `max_mag` or already at the reject score are marked
/// rejected. The candidate count is the number of remaining stars, capped at
/// `star_num`. The preferred count is the number of positive scores, capped
/// at `max_pref_num`; if it still exceeds the candidate count it is reset to 1.
pub fn select_ag(
    mut stars: Vec<Candidate>,
    max_mag: f64,
    star_num: usize,
    max_pref_num: usize,
) -> Selection {
    sort_by_preference(&mut stars);

    let mut accepted = 0;
    for star in stars.iter_mut() {
        if star.mag <= max_mag && star.pref > REJECT_PREFERENCE {
            accepted += 1;
        } else {
            star.pref = REJECT_PREFERENCE;
        }
    }
    let candidate_count = accepted.min(star_num);

    let positive = stars.iter().filter(|s| s.pref > 0.0).count();
    let mut preferred_count = positive.min(max_pref_num);
    if preferred_count > candidate_count {
        log::warn!(
            "preferred count {preferred_count} exceeds candidate count {candidate_count}, using 1"
        );
        preferred_count = 1;
    }

    let mut next = 1;
    let ranked = stars
        .into_iter()
        .map(|star| {
            let priority = if star.pref > REJECT_PREFERENCE && next <= candidate_count {
                next += 1;
                Some(next - 1)
            } else {
                None
            };
            RankedStar { star, priority }
        })
        .collect();

    Selection {
        ranked,
        candidate_count,
        preferred_count,
    }
}

/// Reduced tool selection: the best `star_num` stars, no filtering.
pub fn select_sh(mut stars: Vec<Candidate>, star_num: usize, max_pref_num: usize) -> Selection {
    sort_by_preference(&mut stars);

    let candidate_count = star_num.min(stars.len());
    let preferred_count = stars[..candidate_count]
        .iter()
        .filter(|s| s.pref > 0.0)
        .count()
        .min(max_pref_num);

    let ranked = stars
        .into_iter()
        .enumerate()
        .map(|(i, star)| RankedStar {
            star,
            priority: (i < candidate_count).then_some(i + 1),
        })
        .collect();

    Selection {
        ranked,
        candidate_count,
        preferred_count,
    }
}
