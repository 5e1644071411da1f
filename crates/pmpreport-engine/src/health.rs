//! Epic schedule health
//!
//! Health is decided by an ordered table of guards; the first guard that
//! matches wins.
//!
//! | # | Guard | Health |
//! |---|-------|--------|
//! | 1 | no Features | `NoFeatures` |
//! | 2 | rolled-up end after the critical date | `CriticalDateBreach` |
//! | 3 | end variance unknown | `Unknown` |
//! | 4 | end variance <= 0 | `OnTrack` |
//! | 5 | end variance <= 5 days | `AtRisk` |
//! | 6 | otherwise | `Behind` |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// End-variance slack (days) tolerated before an Epic counts as behind
pub const AT_RISK_THRESHOLD_DAYS: i64 = 5;

/// Schedule health of an enriched Epic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpicHealth {
    /// Epic has no Features to roll up
    NoFeatures,
    /// Features finish after the Epic's immovable deadline
    CriticalDateBreach,
    /// Target date or rolled-up end missing
    Unknown,
    /// Features finish on or before the target
    OnTrack,
    /// Features finish up to five days after the target
    AtRisk,
    /// Features finish more than five days after the target
    Behind,
}

struct Inputs {
    feature_count: usize,
    rolled_up_end: Option<NaiveDate>,
    critical_date: Option<NaiveDate>,
    end_variance: Option<i64>,
}

type Guard = fn(&Inputs) -> bool;

const DECISION_TABLE: [(Guard, EpicHealth); 6] = [
    (|i| i.feature_count == 0, EpicHealth::NoFeatures),
    (
        |i| matches!((i.rolled_up_end, i.critical_date), (Some(end), Some(critical)) if end > critical),
        EpicHealth::CriticalDateBreach,
    ),
    (|i| i.end_variance.is_none(), EpicHealth::Unknown),
    (|i| i.end_variance.is_some_and(|d| d <= 0), EpicHealth::OnTrack),
    (
        |i| i.end_variance.is_some_and(|d| d <= AT_RISK_THRESHOLD_DAYS),
        EpicHealth::AtRisk,
    ),
    (|_| true, EpicHealth::Behind),
];

impl EpicHealth {
    /// Evaluate the decision table
    pub fn assess(
        feature_count: usize,
        rolled_up_end: Option<NaiveDate>,
        critical_date: Option<NaiveDate>,
        end_variance: Option<i64>,
    ) -> Self {
        let inputs = Inputs {
            feature_count,
            rolled_up_end,
            critical_date,
            end_variance,
        };
        DECISION_TABLE
            .iter()
            .find(|(guard, _)| guard(&inputs))
            .map_or(EpicHealth::Behind, |&(_, health)| health)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EpicHealth::NoFeatures => "No Features",
            EpicHealth::CriticalDateBreach => "Critical Date Breach",
            EpicHealth::Unknown => "Unknown",
            EpicHealth::OnTrack => "On Track",
            EpicHealth::AtRisk => "At Risk",
            EpicHealth::Behind => "Behind",
        }
    }
}

impl std::fmt::Display for EpicHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
