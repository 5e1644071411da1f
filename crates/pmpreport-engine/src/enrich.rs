//! Epic enrichment: rollups, variances and links
//!
//! Each Epic is joined with its Feature rollup (left-outer: an Epic with no
//! Features still appears, with zero counts and absent rollup dates) and
//! gains four signed day-count variances:
//!
//! | Variance | Formula | Positive means |
//! |----------|---------|----------------|
//! | `start_date_variance` | rolled-up start − start | Features start after the Epic |
//! | `end_date_variance` | rolled-up end − target | Features finish after the Epic target |
//! | `original_start_variance` | start − original start | Epic start slipped from baseline |
//! | `original_end_variance` | target − original end | Epic target slipped from baseline |
//!
//! A variance is absent whenever either operand is absent; it is never
//! clamped or zero-filled.

use crate::aggregate::{AggregateMap, FeatureAggregate};
use crate::health::EpicHealth;
use chrono::NaiveDate;
use pmpreport_core::date::signed_days;
use pmpreport_core::{LinkConfig, ParentItem, WorkItemId};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// Epic joined with its rollup, variances, link and health
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedParent {
    #[serde(flatten)]
    pub parent: ParentItem,
    #[serde(flatten)]
    pub rollup: FeatureAggregate,
    pub start_date_variance: Option<i64>,
    pub end_date_variance: Option<i64>,
    pub original_start_variance: Option<i64>,
    pub original_end_variance: Option<i64>,
    pub link: String,
    pub health: EpicHealth,
}

impl EnrichedParent {
    pub fn id(&self) -> &str {
        &self.parent.id
    }

    pub fn rolled_up_start(&self) -> Option<NaiveDate> {
        self.rollup.rolled_up_start
    }

    pub fn rolled_up_end(&self) -> Option<NaiveDate> {
        self.rollup.rolled_up_end
    }
}

/// Joins Epics with Feature rollups
pub struct EpicEnricher {
    links: LinkConfig,
}

impl EpicEnricher {
    pub fn new(links: LinkConfig) -> Self {
        Self { links }
    }

    /// Rollup used for Epics that have no Features
    pub fn default_rollup() -> FeatureAggregate {
        FeatureAggregate::default()
    }

    /// Enrich one Epic with an optional rollup
    pub fn enrich_one(&self, parent: &ParentItem, rollup: Option<&FeatureAggregate>) -> EnrichedParent {
        let rollup = rollup.cloned().unwrap_or_else(Self::default_rollup);

        let start_date_variance = signed_days(rollup.rolled_up_start, parent.start_date);
        let end_date_variance = signed_days(rollup.rolled_up_end, parent.target_date);
        let original_start_variance = signed_days(parent.start_date, parent.original_start_date);
        let original_end_variance = signed_days(parent.target_date, parent.original_end_date);

        let health = EpicHealth::assess(
            rollup.feature_count,
            rollup.rolled_up_end,
            parent.critical_date,
            end_date_variance,
        );

        EnrichedParent {
            link: self.links.work_item_url(&parent.id),
            parent: parent.clone(),
            rollup,
            start_date_variance,
            end_date_variance,
            original_start_variance,
            original_end_variance,
            health,
        }
    }

    /// Enrich every Epic and sort by (area path, title)
    pub fn enrich(&self, parents: &[ParentItem], rollups: &AggregateMap) -> EpicTable {
        let mut rows: Vec<EnrichedParent> = parents
            .iter()
            .map(|parent| self.enrich_one(parent, rollups.get(&parent.id)))
            .collect();

        rows.sort_by(|a, b| {
            a.parent
                .area_path
                .cmp(&b.parent.area_path)
                .then_with(|| a.parent.title.cmp(&b.parent.title))
        });

        let without_features = rows.iter().filter(|r| r.rollup.feature_count == 0).count();
        debug!(epics = rows.len(), without_features, "enriched epics");

        EpicTable::new(rows)
    }
}

/// Enriched Epics in display order, with lookup by id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpicTable {
    rows: Vec<EnrichedParent>,
    index: HashMap<WorkItemId, usize>,
}

impl Serialize for EpicTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl EpicTable {
    pub fn new(rows: Vec<EnrichedParent>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.parent.id.clone(), pos))
            .collect();
        Self { rows, index }
    }

    /// Look up an enriched Epic by id
    pub fn get(&self, id: &str) -> Option<&EnrichedParent> {
        self.index.get(id).map(|&pos| &self.rows[pos])
    }

    pub fn rows(&self) -> &[EnrichedParent] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichedParent> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
