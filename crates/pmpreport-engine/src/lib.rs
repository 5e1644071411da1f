//! # pmpreport-engine
//!
//! Rollup and classification passes over work-item snapshots.
//!
//! This crate provides:
//! - Feature rollups per Epic (`FeatureAggregator`)
//! - Epic enrichment with variances, links and health (`EpicEnricher`)
//! - Period classification of PMP milestones (`MilestoneClassifier`)
//! - Report ordering and counts (`ResultSorter`, `MilestoneReport`)
//! - Last-pass-wins publication of refresh results (`PassStore`)
//!
//! Every pass is a pure function of its input snapshot and can be re-run on
//! each refresh.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pmpreport_core::{ChildItem, LinkConfig, ParentItem};
//! use pmpreport_engine::enrich_epics;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day);
//! let features = vec![
//!     ChildItem::new("11").parent("1").state("Active").dates(d(1, 1), d(1, 30)),
//!     ChildItem::new("12").parent("1").state("Done").dates(d(2, 1), d(3, 30)),
//! ];
//! let epics = vec![ParentItem::new("1", "Checkout").current(d(1, 1), d(3, 15))];
//!
//! let table = enrich_epics(&features, &epics, &LinkConfig::new("contoso", "Roadmap"));
//! let epic = table.get("1").unwrap();
//! assert_eq!(epic.rollup.feature_count, 2);
//! assert_eq!(epic.end_date_variance, Some(15));
//! ```

pub mod aggregate;
pub mod classify;
pub mod enrich;
pub mod health;
pub mod pass;
pub mod report;
pub mod sort;

pub use aggregate::{AggregateMap, FeatureAggregate, FeatureAggregator};
pub use classify::{ClassifiedMilestone, MilestoneClassifier, MilestoneStatus, ProjectFilter};
pub use enrich::{EnrichedParent, EpicEnricher, EpicTable};
pub use health::EpicHealth;
pub use pass::{PassError, PassId, PassStore, Published};
pub use report::{EmptyState, MilestoneReport, ReportSummary};
pub use sort::ResultSorter;

use pmpreport_core::{ChildItem, LinkConfig, ParentItem};

/// Aggregate Features and enrich Epics in one pass
pub fn enrich_epics(features: &[ChildItem], epics: &[ParentItem], links: &LinkConfig) -> EpicTable {
    let rollups = FeatureAggregator::aggregate(features);
    EpicEnricher::new(links.clone()).enrich(epics, &rollups)
}
