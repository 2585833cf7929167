//! Selection modes: which questions a session presents, and in what order

use crate::error::{Error, Result};
use crate::store::QuestionTable;
use rand::seq::SliceRandom;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strategy for selecting and ordering the questions of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    /// Every question in table order
    Sequential,
    /// Questions whose number lies in the range, table order
    RangeOrdered,
    /// Questions whose number lies in the range, shuffled
    RangeRandom,
    /// Flagged questions, table order
    FlaggedOrdered,
    /// Flagged questions, shuffled
    FlaggedRandom,
}

impl StudyMode {
    pub const ALL: [StudyMode; 5] = [
        StudyMode::Sequential,
        StudyMode::RangeOrdered,
        StudyMode::RangeRandom,
        StudyMode::FlaggedOrdered,
        StudyMode::FlaggedRandom,
    ];

    pub fn is_range(self) -> bool {
        matches!(self, StudyMode::RangeOrdered | StudyMode::RangeRandom)
    }

    pub fn is_flagged(self) -> bool {
        matches!(self, StudyMode::FlaggedOrdered | StudyMode::FlaggedRandom)
    }

    pub fn is_random(self) -> bool {
        matches!(self, StudyMode::RangeRandom | StudyMode::FlaggedRandom)
    }

    pub fn description(self) -> &'static str {
        match self {
            StudyMode::Sequential => "All questions in table order",
            StudyMode::RangeOrdered => "Questions numbered start..=end, in table order",
            StudyMode::RangeRandom => "Questions numbered start..=end, shuffled",
            StudyMode::FlaggedOrdered => "Flagged questions, in table order",
            StudyMode::FlaggedRandom => "Flagged questions, shuffled",
        }
    }
}

/// Inclusive range of question numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter {
    pub start: u32,
    pub end: u32,
}

impl RangeFilter {
    pub fn contains(&self, key: u32) -> bool {
        self.start <= key && key <= self.end
    }
}

/// Build a range from optional bounds.
///
/// Missing bounds default to the lowest and highest question number in the
/// table; given bounds are clamped into that interval.
pub fn resolve_range(
    table: &QuestionTable,
    start: Option<u32>,
    end: Option<u32>,
) -> Result<RangeFilter> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
    }

    let (min, max) = table.key_bounds().unwrap_or((0, 0));
    let start = start.unwrap_or(min).clamp(min, max);
    let end = end.unwrap_or(max).clamp(min, max);

    if start > end {
        return Err(Error::InvalidRange { start, end });
    }

    Ok(RangeFilter { start, end })
}

/// Row indices for a session in presentation order
pub fn select_questions<R: Rng + ?Sized>(
    table: &QuestionTable,
    mode: StudyMode,
    range: RangeFilter,
    flagged: &BTreeSet<String>,
    rng: &mut R,
) -> Vec<usize> {
    let rows = table.rows().iter().enumerate();

    let mut indices: Vec<usize> = match mode {
        StudyMode::Sequential => rows.map(|(i, _)| i).collect(),
        StudyMode::RangeOrdered | StudyMode::RangeRandom => rows
            .filter(|(_, row)| range.contains(row.numeric_key()))
            .map(|(i, _)| i)
            .collect(),
        StudyMode::FlaggedOrdered | StudyMode::FlaggedRandom => rows
            .filter(|(_, row)| flagged.contains(&row.id))
            .map(|(i, _)| i)
            .collect(),
    };

    if mode.is_random() {
        indices.shuffle(rng);
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::QuestionRow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(ids: &[&str]) -> QuestionTable {
        QuestionTable::from_rows(
            ids.iter()
                .map(|id| QuestionRow {
                    id: id.to_string(),
                    question: String::new(),
                    options: String::new(),
                    answer: String::new(),
                    images: String::new(),
                    page: 1,
                })
                .collect(),
        )
    }

    #[test]
    fn test_sequential_keeps_table_order() {
        let t = table(&["Q3", "Q1", "Q2"]);
        let all = RangeFilter { start: 0, end: 0 };
        let picked = select_questions(
            &t,
            StudyMode::Sequential,
            all,
            &BTreeSet::new(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn test_range_ordered_and_random() {
        let t = table(&["Q1", "Q2", "Q3", "Q4", "Q5"]);
        let range = RangeFilter { start: 2, end: 4 };
        let mut rng = StdRng::seed_from_u64(7);

        let ordered = select_questions(&t, StudyMode::RangeOrdered, range, &BTreeSet::new(), &mut rng);
        assert_eq!(ordered, vec![1, 2, 3]);

        let mut shuffled =
            select_questions(&t, StudyMode::RangeRandom, range, &BTreeSet::new(), &mut rng);
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec![1, 2, 3]);
    }

    #[test]
    fn test_flagged_modes() {
        let t = table(&["Q1", "Q2", "Q3", "Q4", "Q5"]);
        let flagged: BTreeSet<String> = ["Q4", "Q1", "Q9"].iter().map(|s| s.to_string()).collect();
        let range = RangeFilter { start: 0, end: 0 };
        let mut rng = StdRng::seed_from_u64(3);

        let ordered = select_questions(&t, StudyMode::FlaggedOrdered, range, &flagged, &mut rng);
        assert_eq!(ordered, vec![0, 3]);

        let mut shuffled = select_questions(&t, StudyMode::FlaggedRandom, range, &flagged, &mut rng);
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec![0, 3]);
    }

    #[test]
    fn test_resolve_range_defaults_and_clamps() {
        let t = table(&["QUESTION 3", "QUESTION 10", "QUESTION 7"]);
        assert_eq!(
            resolve_range(&t, None, None).unwrap(),
            RangeFilter { start: 3, end: 10 }
        );
        assert_eq!(
            resolve_range(&t, Some(1), Some(500)).unwrap(),
            RangeFilter { start: 3, end: 10 }
        );
        assert_eq!(
            resolve_range(&t, Some(5), None).unwrap(),
            RangeFilter { start: 5, end: 10 }
        );
        assert!(matches!(
            resolve_range(&t, Some(8), Some(4)),
            Err(Error::InvalidRange { start: 8, end: 4 })
        ));
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: StudyMode = serde_json::from_str("\"flagged_random\"").unwrap();
        assert_eq!(mode, StudyMode::FlaggedRandom);
        assert_eq!(
            serde_json::to_string(&StudyMode::RangeOrdered).unwrap(),
            "\"range_ordered\""
        );
    }
}
