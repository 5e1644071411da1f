//! # pmpreport-core
//!
//! Core domain model for the pmpreport rollup and milestone engine.
//!
//! This crate provides:
//! - Work-item records: `ChildItem` (Feature), `ParentItem` (Epic), `Milestone`
//! - Lenient decoding of exported field values (`date`)
//! - Two-tier date fallback (`date::DateFallback`, `date::EffectiveDates`)
//! - Fiscal reporting periods (`period`)
//! - Work-item link formatting (`LinkConfig`)
//!
//! Records are immutable snapshots of the tracking backend. Decoding never
//! fails on a bad field value: unparseable dates become absent, unknown
//! flags become `false`.
//!
//! ## Example
//!
//! ```rust
//! use pmpreport_core::Snapshot;
//!
//! let json = r##"{
//!     "features": [
//!         { "id": 11, "parentId": 1, "state": "Active",
//!           "startDate": "2026-01-05", "endDate": "#N/A" }
//!     ]
//! }"##;
//!
//! let snapshot: Snapshot = serde_json::from_str(json).unwrap();
//! assert_eq!(snapshot.features[0].parent_id.as_deref(), Some("1"));
//! assert!(snapshot.features[0].end_date.is_none());
//! assert!(snapshot.milestones.is_empty());
//! ```

pub mod date;
pub mod period;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use date::{DateFallback, EffectiveDates};
pub use period::{FiscalYear, PeriodError, PeriodResolver, PeriodSelection, Quarter, QuarterSelection, ReportingPeriod};

// ============================================================================
// Type Aliases
// ============================================================================

/// Work-item identifier as exported by the tracking backend
pub type WorkItemId = String;

/// Workflow states that mark a feature as finished
pub const FINISHED_STATES: [&str; 2] = ["Done", "Closed"];

// ============================================================================
// Records
// ============================================================================

/// A Feature: child work item whose dates roll up into its Epic
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildItem {
    #[serde(deserialize_with = "date::deserialize_id")]
    pub id: WorkItemId,
    /// Parent Epic id; `None` marks an orphan
    #[serde(default, deserialize_with = "date::deserialize_optional_id")]
    pub parent_id: Option<WorkItemId>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub end_date: Option<NaiveDate>,
}

impl ChildItem {
    pub fn new(id: impl Into<WorkItemId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the parent Epic
    pub fn parent(mut self, parent_id: impl Into<WorkItemId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the workflow state
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Set start and end dates
    pub fn dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Whether the feature is still in flight (not Done or Closed)
    pub fn is_active(&self) -> bool {
        !FINISHED_STATES.contains(&self.state.as_str())
    }

    /// Whether both start and end dates are present
    pub fn has_dates(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }
}

/// An Epic: parent work item with current, baseline and critical dates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentItem {
    #[serde(deserialize_with = "date::deserialize_id")]
    pub id: WorkItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub area_path: String,
    /// Current start date
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub start_date: Option<NaiveDate>,
    /// Current target (end) date
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub target_date: Option<NaiveDate>,
    /// Baseline start commitment
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub original_start_date: Option<NaiveDate>,
    /// Baseline end commitment
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub original_end_date: Option<NaiveDate>,
    /// Immovable deadline
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub critical_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_integer")]
    pub priority: Option<u32>,
    #[serde(default, deserialize_with = "date::deserialize_decimal")]
    pub effort: Option<Decimal>,
    #[serde(default, deserialize_with = "date::deserialize_flag")]
    pub key_deliverable: bool,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub last_updated: Option<NaiveDate>,
}

impl ParentItem {
    pub fn new(id: impl Into<WorkItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn area_path(mut self, area_path: impl Into<String>) -> Self {
        self.area_path = area_path.into();
        self
    }

    /// Set current start and target dates
    pub fn current(mut self, start: Option<NaiveDate>, target: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.target_date = target;
        self
    }

    /// Set baseline start and end dates
    pub fn original(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.original_start_date = start;
        self.original_end_date = end;
        self
    }

    pub fn critical_date(mut self, date: NaiveDate) -> Self {
        self.critical_date = Some(date);
        self
    }
}

/// A Project Management Plan milestone
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[serde(deserialize_with = "date::deserialize_id")]
    pub id: WorkItemId,
    #[serde(default)]
    pub title: String,
    /// Team project the milestone belongs to (matched by the project filter)
    #[serde(default, deserialize_with = "date::deserialize_optional_id")]
    pub project: Option<String>,
    #[serde(default, deserialize_with = "date::deserialize_flag")]
    pub is_pmp_milestone: bool,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub planned_start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub target_end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub original_start_date_pmp: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub original_end_date_pmp: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_date")]
    pub closed_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date::deserialize_flag")]
    pub is_critical_date: bool,
    #[serde(default, deserialize_with = "date::deserialize_flag")]
    pub is_key_feature: bool,
}

impl Milestone {
    /// Create a PMP milestone
    pub fn new(id: impl Into<WorkItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_pmp_milestone: true,
            ..Self::default()
        }
    }

    /// Set current planned start and target end
    pub fn planned(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.planned_start_date = start;
        self.target_end_date = end;
        self
    }

    /// Set baseline PMP start and end
    pub fn original(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.original_start_date_pmp = start;
        self.original_end_date_pmp = end;
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// One refresh worth of records from the tracking backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub features: Vec<ChildItem>,
    pub epics: Vec<ParentItem>,
    pub milestones: Vec<Milestone>,
}

impl Snapshot {
    /// True when no records of any kind were loaded
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.epics.is_empty() && self.milestones.is_empty()
    }
}

// ============================================================================
// Links
// ============================================================================

/// Default host for work-item links
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// Organization and project used to build work-item links
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub organization: String,
    pub project: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl LinkConfig {
    pub fn new(organization: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            organization: organization.into(),
            project: project.into(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Edit URL for a work item
    pub fn work_item_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}/_workitems/edit/{}",
            self.base_url.trim_end_matches('/'),
            encode_path_segment(&self.organization),
            encode_path_segment(&self.project),
            encode_path_segment(id)
        )
    }
}

/// Percent-encode everything outside the unreserved URL set
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
