//! Milestone report for a fiscal selection
//!
//! Ties the period, classifier, project filter and sorter together and keeps
//! enough context for consumers to tell "nothing loaded" apart from
//! "nothing matched".

use crate::classify::{ClassifiedMilestone, MilestoneClassifier, MilestoneStatus, ProjectFilter};
use crate::sort::ResultSorter;
use pmpreport_core::{LinkConfig, Milestone, PeriodSelection, ReportingPeriod};
use serde::Serialize;
use tracing::{debug, info_span};

/// Why a report has no rows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EmptyState {
    /// No milestone records were loaded at all
    NoData,
    /// Milestones were loaded but none survived classification and filtering
    NoMatches,
}

/// Classified milestones for one selection, in report order
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneReport {
    pub selection: PeriodSelection,
    pub period: ReportingPeriod,
    /// Project filter text, if one was applied
    pub project_filter: Option<String>,
    /// Number of milestone records supplied, before any filtering
    pub input_count: usize,
    pub rows: Vec<ClassifiedMilestone>,
}

impl MilestoneReport {
    /// Run the classification pass.
    ///
    /// Non-PMP milestones are dropped, the rest classified against the
    /// selected period, the project filter applied, and the rows sorted.
    pub fn build(
        milestones: &[Milestone],
        selection: PeriodSelection,
        filter: &ProjectFilter,
        links: Option<&LinkConfig>,
    ) -> Self {
        let period = selection.period();
        let _span = info_span!("milestone_report", %selection).entered();

        let mut classifier = MilestoneClassifier::new(period);
        if let Some(links) = links {
            classifier = classifier.with_links(links.clone());
        }

        let classified = classifier.classify(milestones);
        let classified_count = classified.len();
        let mut rows: Vec<ClassifiedMilestone> = classified
            .into_iter()
            .filter(|row| filter.matches(&row.milestone))
            .collect();
        ResultSorter::sort(&mut rows);

        debug!(
            classified = classified_count,
            reported = rows.len(),
            filtered = filter.is_active(),
            "built milestone report"
        );

        Self {
            selection,
            period,
            project_filter: filter.text().map(str::to_string),
            input_count: milestones.len(),
            rows,
        }
    }

    /// Why the report is empty, or `None` when it has rows
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.rows.is_empty() {
            None
        } else if self.input_count == 0 {
            Some(EmptyState::NoData)
        } else {
            Some(EmptyState::NoMatches)
        }
    }

    /// Rows of one category, in report order
    pub fn with_status(&self, status: MilestoneStatus) -> impl Iterator<Item = &ClassifiedMilestone> {
        self.rows.iter().filter(move |row| row.status == status)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_rows(&self.rows)
    }
}

/// Headline counts over a milestone report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub scheduled: usize,
    pub delayed: usize,
    pub critical_dates: usize,
    pub key_features: usize,
    pub delayed_critical_dates: usize,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ClassifiedMilestone]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total += 1;
            match row.status {
                MilestoneStatus::Scheduled => summary.scheduled += 1,
                MilestoneStatus::Delayed => {
                    summary.delayed += 1;
                    if row.milestone.is_critical_date {
                        summary.delayed_critical_dates += 1;
                    }
                }
            }
            if row.milestone.is_critical_date {
                summary.critical_dates += 1;
            }
            if row.milestone.is_key_feature {
                summary.key_features += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pmpreport_core::{FiscalYear, Quarter};
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn fy2026_q3() -> PeriodSelection {
        PeriodSelection {
            fiscal_year: FiscalYear::new(2026).unwrap(),
            quarter: Quarter::Q3.into(),
        }
    }

    fn sample() -> Vec<Milestone> {
        let mut critical = Milestone::new("3", "Regulator sign-off")
            .planned(Some(date(2026, 4, 20)), Some(date(2026, 5, 1)))
            .original(Some(date(2026, 2, 1)), Some(date(2026, 3, 1)))
            .project("Payments");
        critical.is_critical_date = true;

        let mut key = Milestone::new("2", "Beta")
            .planned(Some(date(2026, 2, 1)), Some(date(2026, 3, 10)))
            .project("Payments");
        key.is_key_feature = true;

        let mut not_pmp = Milestone::new("4", "Team offsite").planned(Some(date(2026, 2, 1)), Some(date(2026, 2, 2)));
        not_pmp.is_pmp_milestone = false;

        vec![
            critical,
            key,
            Milestone::new("1", "Design freeze")
                .planned(Some(date(2026, 1, 5)), Some(date(2026, 1, 20)))
                .project("Identity"),
            not_pmp,
        ]
    }

    #[test]
    fn test_report_rows_sorted_and_summarised() {
        let report = MilestoneReport::build(&sample(), fy2026_q3(), &ProjectFilter::default(), None);

        let ids: Vec<&str> = report.rows.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(report.input_count, 4);
        assert_eq!(report.empty_state(), None);
        assert_eq!(
            report.summary(),
            ReportSummary {
                total: 3,
                scheduled: 2,
                delayed: 1,
                critical_dates: 1,
                key_features: 1,
                delayed_critical_dates: 1,
            }
        );
        assert_eq!(report.with_status(MilestoneStatus::Delayed).count(), 1);
    }

    #[test]
    fn test_project_filter_applies_after_classification() {
        let filter = ProjectFilter::new(Some("Payments"));
        let report = MilestoneReport::build(&sample(), fy2026_q3(), &filter, None);

        let ids: Vec<&str> = report.rows.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(report.project_filter.as_deref(), Some("Payments"));
    }

    #[test]
    fn test_empty_states_are_distinct() {
        let none = MilestoneReport::build(&[], fy2026_q3(), &ProjectFilter::default(), None);
        assert_eq!(none.empty_state(), Some(EmptyState::NoData));

        let filter = ProjectFilter::new(Some("nonexistent"));
        let filtered = MilestoneReport::build(&sample(), fy2026_q3(), &filter, None);
        assert_eq!(filtered.empty_state(), Some(EmptyState::NoMatches));
        assert_eq!(filtered.input_count, 4);
    }

    #[test]
    fn test_rerun_is_repeatable() {
        let milestones = sample();
        let first = MilestoneReport::build(&milestones, fy2026_q3(), &ProjectFilter::default(), None);
        let second = MilestoneReport::build(&milestones, fy2026_q3(), &ProjectFilter::default(), None);
        assert_eq!(first, second);
    }
}
