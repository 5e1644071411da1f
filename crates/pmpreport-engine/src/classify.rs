//! Period classification of PMP milestones
//!
//! Only milestones flagged as PMP milestones are considered. Each one is
//! tested against the reporting period in a fixed order, first match wins:
//!
//! 1. **Scheduled**: the milestone carries a current plan (a planned start or
//!    a target end), and the effective range (planned start falling back to
//!    the original PMP start, target end falling back to the original PMP
//!    end) resolves at both ends and overlaps the period. The closed date
//!    plays no part.
//! 2. **Delayed**: both original PMP dates are present, the original range
//!    overlaps the period, and the planned start is either missing or after
//!    the period end.
//!
//! Milestones matching neither are left out of the result.

use chrono::NaiveDate;
use pmpreport_core::{DateFallback, EffectiveDates, LinkConfig, Milestone, ReportingPeriod};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Schedule-health category of a milestone within a period
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    Scheduled,
    Delayed,
}

impl MilestoneStatus {
    /// Categories in report order
    pub const ORDER: [MilestoneStatus; 2] = [MilestoneStatus::Scheduled, MilestoneStatus::Delayed];

    /// Position of the category in report order
    pub fn rank(&self) -> usize {
        match self {
            MilestoneStatus::Scheduled => 0,
            MilestoneStatus::Delayed => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Scheduled => "Scheduled",
            MilestoneStatus::Delayed => "Delayed",
        }
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A milestone with its category and the dates it was judged on
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub status: MilestoneStatus,
    pub effective_start: Option<NaiveDate>,
    pub effective_end: Option<NaiveDate>,
    /// Effective end for Scheduled, original PMP end for Delayed
    pub sort_date: Option<NaiveDate>,
    pub link: String,
}

impl ClassifiedMilestone {
    pub fn id(&self) -> &str {
        &self.milestone.id
    }
}

/// Effective dates of a milestone after two-tier fallback
pub fn effective_dates(milestone: &Milestone) -> EffectiveDates {
    EffectiveDates::resolve(
        DateFallback::new(milestone.planned_start_date, milestone.original_start_date_pmp),
        DateFallback::new(milestone.target_end_date, milestone.original_end_date_pmp),
    )
}

/// Classifies milestones against one reporting period
pub struct MilestoneClassifier {
    period: ReportingPeriod,
    links: Option<LinkConfig>,
}

impl MilestoneClassifier {
    pub fn new(period: ReportingPeriod) -> Self {
        Self { period, links: None }
    }

    /// Attach link configuration for the output rows
    pub fn with_links(mut self, links: LinkConfig) -> Self {
        self.links = Some(links);
        self
    }

    pub fn period(&self) -> ReportingPeriod {
        self.period
    }

    /// Scheduled: currently planned, effective range complete and overlapping the period
    fn is_scheduled(&self, milestone: &Milestone, effective: &EffectiveDates) -> bool {
        if milestone.planned_start_date.is_none() && milestone.target_end_date.is_none() {
            return false;
        }
        effective
            .range()
            .is_some_and(|(start, end)| self.period.overlaps(start, end))
    }

    /// Delayed: baseline overlaps the period but the plan has moved past it
    fn is_delayed(&self, milestone: &Milestone) -> bool {
        let Some((original_start, original_end)) = milestone
            .original_start_date_pmp
            .zip(milestone.original_end_date_pmp)
        else {
            return false;
        };
        if !self.period.overlaps(original_start, original_end) {
            return false;
        }
        match milestone.planned_start_date {
            Some(planned) => planned > self.period.end,
            None => true,
        }
    }

    /// Category for a milestone, evaluated Scheduled then Delayed
    pub fn status(&self, milestone: &Milestone) -> Option<MilestoneStatus> {
        if !milestone.is_pmp_milestone {
            return None;
        }
        if self.is_scheduled(milestone, &effective_dates(milestone)) {
            return Some(MilestoneStatus::Scheduled);
        }
        if self.is_delayed(milestone) {
            return Some(MilestoneStatus::Delayed);
        }
        None
    }

    /// Classify a single milestone; `None` when it is filtered out or matches neither category
    pub fn classify_one(&self, milestone: &Milestone) -> Option<ClassifiedMilestone> {
        let status = self.status(milestone)?;
        let effective = effective_dates(milestone);
        let sort_date = match status {
            MilestoneStatus::Scheduled => effective.end,
            MilestoneStatus::Delayed => milestone.original_end_date_pmp,
        };

        Some(ClassifiedMilestone {
            milestone: milestone.clone(),
            status,
            effective_start: effective.start,
            effective_end: effective.end,
            sort_date,
            link: self
                .links
                .as_ref()
                .map(|links| links.work_item_url(&milestone.id))
                .unwrap_or_default(),
        })
    }

    /// Classify all milestones, keeping input order
    pub fn classify(&self, milestones: &[Milestone]) -> Vec<ClassifiedMilestone> {
        let rows: Vec<ClassifiedMilestone> = milestones
            .par_iter()
            .filter_map(|m| {
                let row = self.classify_one(m);
                if row.is_none() {
                    trace!(milestone = %m.id, pmp = m.is_pmp_milestone, "milestone not reported");
                }
                row
            })
            .collect();

        debug!(
            input = milestones.len(),
            classified = rows.len(),
            period = %self.period,
            "classified milestones"
        );
        rows
    }
}

/// Free-text project filter applied after classification
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Trimmed text as entered, for display
    text: Option<String>,
    /// Lowercased text used for matching
    needle: Option<String>,
}

impl ProjectFilter {
    /// Blank text or "all" disables the filter
    pub fn new(text: Option<&str>) -> Self {
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        let needle = text.as_deref().map(str::to_lowercase);
        Self { text, needle }
    }

    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    /// The filter text as entered, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Case-insensitive substring match on the milestone's project
    pub fn matches(&self, milestone: &Milestone) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => milestone
                .project
                .as_deref()
                .is_some_and(|project| project.to_lowercase().contains(needle.as_str())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn q3() -> MilestoneClassifier {
        MilestoneClassifier::new(ReportingPeriod::new(date(2026, 1, 1), date(2026, 3, 31)))
    }

    #[test]
    fn test_non_pmp_milestones_never_classified() {
        let mut milestone = Milestone::new("1", "Internal")
            .planned(Some(date(2026, 2, 1)), Some(date(2026, 2, 10)));
        milestone.is_pmp_milestone = false;
        assert_eq!(q3().status(&milestone), None);
        assert!(q3().classify(&[milestone]).is_empty());
    }

    #[test]
    fn test_scheduled_with_fallback_end() {
        let milestone = Milestone::new("1", "Pilot")
            .planned(Some(date(2026, 2, 15)), None)
            .original(None, Some(date(2026, 2, 20)));

        let row = q3().classify_one(&milestone).unwrap();

        assert_eq!(row.status, MilestoneStatus::Scheduled);
        assert_eq!(row.effective_start, Some(date(2026, 2, 15)));
        assert_eq!(row.effective_end, Some(date(2026, 2, 20)));
        assert_eq!(row.sort_date, Some(date(2026, 2, 20)));
    }

    #[test]
    fn test_scheduled_ignores_closed_date() {
        let mut milestone = Milestone::new("1", "Done early")
            .planned(Some(date(2026, 1, 10)), Some(date(2026, 1, 20)));
        milestone.closed_date = Some(date(2025, 12, 1));
        assert_eq!(q3().status(&milestone), Some(MilestoneStatus::Scheduled));
    }

    #[test]
    fn test_scheduled_overlap_boundaries() {
        let touching_start = Milestone::new("1", "a").planned(Some(date(2025, 12, 1)), Some(date(2026, 1, 1)));
        let touching_end = Milestone::new("2", "b").planned(Some(date(2026, 3, 31)), Some(date(2026, 4, 30)));
        let before = Milestone::new("3", "c").planned(Some(date(2025, 11, 1)), Some(date(2025, 12, 31)));

        assert_eq!(q3().status(&touching_start), Some(MilestoneStatus::Scheduled));
        assert_eq!(q3().status(&touching_end), Some(MilestoneStatus::Scheduled));
        assert_eq!(q3().status(&before), None);
    }

    #[test]
    fn test_unresolved_endpoint_falls_through() {
        // No end at all: cannot be Scheduled, and no original dates so not Delayed
        let milestone = Milestone::new("1", "Open ended").planned(Some(date(2026, 2, 1)), None);
        assert_eq!(q3().status(&milestone), None);
    }

    #[test]
    fn test_delayed_without_planned_dates() {
        let milestone = Milestone::new("1", "Unplanned").original(Some(date(2026, 1, 1)), Some(date(2026, 2, 28)));

        let row = q3().classify_one(&milestone).unwrap();

        assert_eq!(row.status, MilestoneStatus::Delayed);
        assert_eq!(row.effective_start, Some(date(2026, 1, 1)));
        assert_eq!(row.effective_end, Some(date(2026, 2, 28)));
        assert_eq!(row.sort_date, Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_start_falls_back_when_only_target_end_planned() {
        let milestone = Milestone::new("1", "Half planned")
            .planned(None, Some(date(2026, 3, 15)))
            .original(Some(date(2026, 1, 10)), Some(date(2026, 2, 28)));

        let row = q3().classify_one(&milestone).unwrap();

        assert_eq!(row.status, MilestoneStatus::Scheduled);
        assert_eq!(row.effective_start, Some(date(2026, 1, 10)));
        assert_eq!(row.sort_date, Some(date(2026, 3, 15)));
    }

    #[test]
    fn test_delayed_when_planned_start_after_period() {
        let milestone = Milestone::new("1", "Pushed")
            .planned(Some(date(2026, 4, 15)), Some(date(2026, 5, 30)))
            .original(Some(date(2026, 1, 1)), Some(date(2026, 2, 28)));

        let row = q3().classify_one(&milestone).unwrap();

        assert_eq!(row.status, MilestoneStatus::Delayed);
        assert_eq!(row.effective_start, Some(date(2026, 4, 15)));
        assert_eq!(row.effective_end, Some(date(2026, 5, 30)));
        assert_eq!(row.sort_date, Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_delayed_requires_raw_original_dates() {
        let milestone = Milestone::new("1", "No baseline start")
            .planned(Some(date(2026, 4, 15)), Some(date(2026, 5, 30)))
            .original(None, Some(date(2026, 2, 28)));
        assert_eq!(q3().status(&milestone), None);
    }

    #[test]
    fn test_delayed_requires_original_overlap() {
        let milestone = Milestone::new("1", "Old baseline")
            .planned(Some(date(2026, 4, 15)), Some(date(2026, 5, 30)))
            .original(Some(date(2025, 10, 1)), Some(date(2025, 12, 31)));
        assert_eq!(q3().status(&milestone), None);
    }

    #[test]
    fn test_planned_start_on_period_end_is_not_delayed() {
        // Planned start on the last day overlaps, so this is Scheduled instead
        let milestone = Milestone::new("1", "Edge")
            .planned(Some(date(2026, 3, 31)), Some(date(2026, 4, 10)))
            .original(Some(date(2026, 1, 1)), Some(date(2026, 2, 28)));
        assert_eq!(q3().status(&milestone), Some(MilestoneStatus::Scheduled));
    }

    #[test]
    fn test_delayed_with_planned_start_only_missing_end() {
        // Planned start missing, target end before the period: effective range
        // resolves from the original start and the target end, does not overlap
        let milestone = Milestone::new("1", "Rebaselined")
            .planned(None, Some(date(2025, 12, 15)))
            .original(Some(date(2025, 12, 1)), Some(date(2026, 1, 15)));

        let row = q3().classify_one(&milestone).unwrap();
        assert_eq!(row.status, MilestoneStatus::Delayed);
        assert_eq!(row.effective_start, Some(date(2025, 12, 1)));
        assert_eq!(row.effective_end, Some(date(2025, 12, 15)));
        assert_eq!(row.sort_date, Some(date(2026, 1, 15)));
    }

    #[test]
    fn test_classify_preserves_input_order() {
        let milestones: Vec<Milestone> = (1..=50)
            .map(|n| {
                Milestone::new(n.to_string(), format!("m{n}"))
                    .planned(Some(date(2026, 1, 1)), Some(date(2026, 1, 1) + chrono::Days::new(n)))
            })
            .collect();

        let ids: Vec<String> = q3().classify(&milestones).into_iter().map(|r| r.milestone.id).collect();
        let expected: Vec<String> = (1..=50).map(|n: u64| n.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_links_attached_when_configured() {
        let classifier = q3().with_links(LinkConfig::new("contoso", "Roadmap"));
        let milestone = Milestone::new("77", "Launch").planned(Some(date(2026, 2, 1)), Some(date(2026, 2, 2)));
        let row = classifier.classify_one(&milestone).unwrap();
        assert_eq!(row.link, "https://dev.azure.com/contoso/Roadmap/_workitems/edit/77");

        let row = q3().classify_one(&milestone).unwrap();
        assert_eq!(row.link, "");
    }

    #[test]
    fn test_project_filter() {
        let payments = Milestone::new("1", "a").project("Payments Platform");
        let unassigned = Milestone::new("2", "b");

        let filter = ProjectFilter::new(Some("  PAYMENTS "));
        assert!(filter.is_active());
        assert_eq!(filter.text(), Some("PAYMENTS"));
        assert!(filter.matches(&payments));
        assert!(!filter.matches(&unassigned));

        for text in [None, Some(""), Some("All"), Some("   ")] {
            let filter = ProjectFilter::new(text);
            assert!(!filter.is_active());
            assert!(filter.matches(&payments));
            assert!(filter.matches(&unassigned));
        }
    }
}
