//! Feature date rollups per parent Epic
//!
//! Every Feature with a parent contributes to its Epic's rollup: the earliest
//! start, the latest end, and how many Features exist and carry both dates.
//! A second pair of rollup dates considers only Features that are not yet
//! Done or Closed.
//!
//! Groups never depend on each other, so partial aggregates built from
//! disjoint slices of the input can be combined with
//! [`FeatureAggregate::merge`] / [`merge_maps`].

use chrono::NaiveDate;
use pmpreport_core::{ChildItem, WorkItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Aggregates keyed by parent id
pub type AggregateMap = BTreeMap<WorkItemId, FeatureAggregate>;

/// Earliest start and latest end over a set of Features
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSpan {
    /// Widen the span with one Feature's dates, ignoring absent values
    pub fn include(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.start = earliest(self.start, start);
        self.end = latest(self.end, end);
    }

    pub fn merge(self, other: DateSpan) -> DateSpan {
        DateSpan {
            start: earliest(self.start, other.start),
            end: latest(self.end, other.end),
        }
    }
}

fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Rollup of all Features under one Epic
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAggregate {
    /// Earliest Feature start
    pub rolled_up_start: Option<NaiveDate>,
    /// Latest Feature end
    pub rolled_up_end: Option<NaiveDate>,
    /// Number of Features under the Epic
    pub feature_count: usize,
    /// Features with both a start and an end date
    pub features_with_dates: usize,
    /// Earliest start among Features not Done/Closed
    pub active_rolled_up_start: Option<NaiveDate>,
    /// Latest end among Features not Done/Closed
    pub active_rolled_up_end: Option<NaiveDate>,
}

impl FeatureAggregate {
    /// Fold one Feature into the aggregate
    pub fn add(&mut self, item: &ChildItem) {
        let mut all = self.span();
        all.include(item.start_date, item.end_date);
        self.rolled_up_start = all.start;
        self.rolled_up_end = all.end;

        self.feature_count += 1;
        if item.has_dates() {
            self.features_with_dates += 1;
        }

        if item.is_active() {
            let mut active = self.active_span();
            active.include(item.start_date, item.end_date);
            self.active_rolled_up_start = active.start;
            self.active_rolled_up_end = active.end;
        }
    }

    /// Combine two partial aggregates of the same Epic
    pub fn merge(&self, other: &FeatureAggregate) -> FeatureAggregate {
        let all = self.span().merge(other.span());
        let active = self.active_span().merge(other.active_span());
        FeatureAggregate {
            rolled_up_start: all.start,
            rolled_up_end: all.end,
            feature_count: self.feature_count + other.feature_count,
            features_with_dates: self.features_with_dates + other.features_with_dates,
            active_rolled_up_start: active.start,
            active_rolled_up_end: active.end,
        }
    }

    pub fn span(&self) -> DateSpan {
        DateSpan {
            start: self.rolled_up_start,
            end: self.rolled_up_end,
        }
    }

    pub fn active_span(&self) -> DateSpan {
        DateSpan {
            start: self.active_rolled_up_start,
            end: self.active_rolled_up_end,
        }
    }
}

/// Groups Features by parent and computes their rollups
pub struct FeatureAggregator;

impl FeatureAggregator {
    /// Aggregate Features by parent id.
    ///
    /// Orphans (no parent id) are skipped. Epics without Features get no
    /// entry; the enricher supplies their defaults.
    pub fn aggregate(items: &[ChildItem]) -> AggregateMap {
        let mut groups = AggregateMap::new();
        let mut orphans = 0usize;

        for item in items {
            let Some(parent_id) = item.parent_id.as_ref() else {
                trace!(feature = %item.id, "skipping orphan feature");
                orphans += 1;
                continue;
            };
            groups.entry(parent_id.clone()).or_default().add(item);
        }

        debug!(
            features = items.len(),
            orphans,
            parents = groups.len(),
            "aggregated feature rollups"
        );
        groups
    }
}

/// Combine aggregate maps built from disjoint slices of the input
pub fn merge_maps(mut left: AggregateMap, right: AggregateMap) -> AggregateMap {
    for (parent_id, aggregate) in right {
        left.entry(parent_id)
            .and_modify(|existing| *existing = existing.merge(&aggregate))
            .or_insert(aggregate);
    }
    left
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

    fn feature(id: &str, parent: &str, state: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> ChildItem {
        ChildItem::new(id).parent(parent).state(state).dates(start, end)
    }

    #[test]
    fn test_three_features_roll_up() {
        let items = vec![
            feature("11", "1", "Active", Some(date(2026, 1, 1)), Some(date(2026, 1, 30))),
            feature("12", "1", "Active", Some(date(2026, 2, 1)), Some(date(2026, 2, 28))),
            feature("13", "1", "New", Some(date(2026, 3, 1)), Some(date(2026, 3, 30))),
        ];

        let map = FeatureAggregator::aggregate(&items);
        let agg = &map["1"];

        assert_eq!(agg.rolled_up_start, Some(date(2026, 1, 1)));
        assert_eq!(agg.rolled_up_end, Some(date(2026, 3, 30)));
        assert_eq!(agg.feature_count, 3);
        assert_eq!(agg.features_with_dates, 3);
        assert_eq!(agg.active_rolled_up_start, Some(date(2026, 1, 1)));
        assert_eq!(agg.active_rolled_up_end, Some(date(2026, 3, 30)));
    }

    #[test]
    fn test_missing_start_is_ignored() {
        let items = vec![
            feature("11", "1", "Active", None, Some(date(2026, 2, 28))),
            feature("12", "1", "Active", Some(date(2026, 2, 10)), Some(date(2026, 2, 20))),
        ];
        let agg = &FeatureAggregator::aggregate(&items)["1"];
        assert_eq!(agg.rolled_up_start, Some(date(2026, 2, 10)));
        assert_eq!(agg.rolled_up_end, Some(date(2026, 2, 28)));
        assert_eq!(agg.features_with_dates, 1);

        let single = vec![feature("11", "1", "Active", None, Some(date(2026, 2, 28)))];
        let agg = &FeatureAggregator::aggregate(&single)["1"];
        assert_eq!(agg.rolled_up_start, None);
        assert_eq!(agg.rolled_up_end, Some(date(2026, 2, 28)));
        assert_eq!(agg.features_with_dates, 0);
    }

    #[test]
    fn test_group_without_dates() {
        let items = vec![feature("11", "1", "New", None, None), feature("12", "1", "New", None, None)];
        let agg = &FeatureAggregator::aggregate(&items)["1"];
        assert_eq!(agg.feature_count, 2);
        assert_eq!(agg.features_with_dates, 0);
        assert_eq!(agg.span(), DateSpan::default());
    }

    #[test]
    fn test_orphans_are_dropped() {
        let items = vec![
            ChildItem::new("99").state("Active").dates(Some(date(2020, 1, 1)), Some(date(2030, 1, 1))),
            feature("11", "1", "Active", Some(date(2026, 1, 1)), Some(date(2026, 1, 30))),
        ];
        let map = FeatureAggregator::aggregate(&items);
        assert_eq!(map.len(), 1);
        assert_eq!(map["1"].feature_count, 1);
        assert_eq!(map["1"].rolled_up_start, Some(date(2026, 1, 1)));
    }

    #[test]
    fn test_active_rollup_excludes_done_and_closed() {
        let items = vec![
            feature("11", "1", "Done", Some(date(2026, 1, 1)), Some(date(2026, 1, 30))),
            feature("12", "1", "Active", Some(date(2026, 2, 1)), Some(date(2026, 2, 28))),
            feature("13", "1", "Closed", Some(date(2026, 3, 1)), Some(date(2026, 4, 30))),
        ];
        let agg = &FeatureAggregator::aggregate(&items)["1"];
        assert_eq!(agg.rolled_up_start, Some(date(2026, 1, 1)));
        assert_eq!(agg.rolled_up_end, Some(date(2026, 4, 30)));
        assert_eq!(agg.active_rolled_up_start, Some(date(2026, 2, 1)));
        assert_eq!(agg.active_rolled_up_end, Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_all_finished_leaves_active_rollup_empty() {
        let items = vec![
            feature("11", "1", "Done", Some(date(2026, 1, 1)), Some(date(2026, 1, 30))),
            feature("12", "1", "Closed", Some(date(2026, 2, 1)), Some(date(2026, 2, 28))),
        ];
        let agg = &FeatureAggregator::aggregate(&items)["1"];
        assert_eq!(agg.active_span(), DateSpan::default());
        assert_eq!(agg.feature_count, 2);
    }

    #[test]
    fn test_split_and_merge_matches_single_pass() {
        let items = vec![
            feature("11", "1", "Done", Some(date(2026, 1, 1)), Some(date(2026, 1, 30))),
            feature("21", "2", "Active", None, Some(date(2026, 5, 1))),
            feature("12", "1", "Active", Some(date(2026, 2, 1)), Some(date(2026, 3, 28))),
            feature("22", "2", "Active", Some(date(2026, 4, 1)), None),
            feature("13", "1", "New", None, None),
        ];

        let whole = FeatureAggregator::aggregate(&items);
        let (left, right) = items.split_at(2);
        let merged = merge_maps(FeatureAggregator::aggregate(left), FeatureAggregator::aggregate(right));

        assert_eq!(merged, whole);
    }

    #[test]
    fn test_rollup_invariants_hold() {
        let items = vec![
            feature("11", "1", "Active", Some(date(2026, 3, 1)), Some(date(2026, 3, 10))),
            feature("12", "1", "Active", Some(date(2026, 1, 5)), None),
            feature("21", "2", "Active", None, Some(date(2026, 1, 1))),
            feature("31", "3", "Done", Some(date(2026, 6, 1)), Some(date(2026, 6, 2))),
        ];
        for agg in FeatureAggregator::aggregate(&items).values() {
            assert!(agg.features_with_dates <= agg.feature_count);
            assert!(agg.feature_count > 0);
            if let (Some(start), Some(end)) = (agg.rolled_up_start, agg.rolled_up_end) {
                assert!(start <= end);
            }
        }
    }
}
