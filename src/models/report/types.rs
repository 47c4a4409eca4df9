use std::collections::HashMap;

use crate::models::roster::RosterSubset;

/// Filter names accepted by the report endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterName {
    Scope,
    Region,
    SubjectArea,
    Status,
    Organization,
    Role,
}

impl FilterName {
    /// Order used for cache keys and generated clauses, independent of
    /// the order filters were supplied in.
    pub const CANONICAL: [FilterName; 6] = [
        FilterName::Scope,
        FilterName::Region,
        FilterName::SubjectArea,
        FilterName::Organization,
        FilterName::Role,
        FilterName::Status,
    ];

    /// Query-string parameter name; also the column the filter compares.
    pub fn param(&self) -> &'static str {
        match self {
            FilterName::Scope => "scope",
            FilterName::Region => "kab_kota",
            FilterName::SubjectArea => "bidang",
            FilterName::Status => "status",
            FilterName::Organization => "instansi",
            FilterName::Role => "jabatan",
        }
    }

    pub fn from_param(s: &str) -> Option<Self> {
        FilterName::CANONICAL.into_iter().find(|f| f.param() == s)
    }
}

/// Filter values in the order they were inserted. Empty values mean
/// "no filter" and are treated exactly like absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: Vec<(FilterName, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter, replacing any previous value in place.
    pub fn insert(&mut self, name: FilterName, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: FilterName, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Active (non-empty) value for `name`.
    pub fn get(&self, name: FilterName) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, v)| *n == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Active filters in canonical order.
    pub fn active(&self) -> impl Iterator<Item = (FilterName, &str)> {
        FilterName::CANONICAL
            .into_iter()
            .filter_map(|name| self.get(name).map(|v| (name, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Drop every filter `report` does not accept.
    pub fn restricted_to(&self, report: Report) -> FilterSet {
        let allowed = report.filters();
        FilterSet {
            entries: self
                .entries
                .iter()
                .filter(|(n, _)| allowed.contains(n))
                .cloned()
                .collect(),
        }
    }

    /// Pick the report's filters out of raw query parameters.
    pub fn from_query(report: Report, query: &HashMap<String, String>) -> FilterSet {
        let mut set = FilterSet::new();
        for name in report.filters() {
            if let Some(v) = query.get(name.param()) {
                set.insert(*name, v.trim());
            }
        }
        set
    }
}

/// How a report's template receives the filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseStyle {
    /// A fresh `WHERE` over the final projection.
    Where,
    /// A `HAVING` after a `GROUP BY`.
    Having,
    /// Extra `AND` conditions on the directory alias `d`.
    AndDirectory,
}

/// The fixed set of reports the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    KpiProvince,
    KpiRegion,
    Heatmap,
    IssuesDetail,
    Timeline,
    Leaderboard,
    Workload,
}

impl Report {
    pub const ALL: [Report; 7] = [
        Report::KpiProvince,
        Report::KpiRegion,
        Report::Heatmap,
        Report::IssuesDetail,
        Report::Timeline,
        Report::Leaderboard,
        Report::Workload,
    ];

    /// URL stem, template name and cache-key prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Report::KpiProvince => "kpi_provinsi",
            Report::KpiRegion => "kpi_kabkot",
            Report::Heatmap => "heatmap",
            Report::IssuesDetail => "issues_detail",
            Report::Timeline => "timeline",
            Report::Leaderboard => "leaderboard",
            Report::Workload => "workload",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Report::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn filters(&self) -> &'static [FilterName] {
        use FilterName::*;
        match self {
            Report::KpiProvince => &[SubjectArea, Role],
            Report::KpiRegion => &[SubjectArea, Organization, Role],
            Report::Heatmap => &[Region, SubjectArea],
            Report::IssuesDetail | Report::Timeline => &[Scope, Region, SubjectArea, Status],
            Report::Leaderboard | Report::Workload => &[Scope, SubjectArea],
        }
    }

    pub fn roster_subset(&self) -> RosterSubset {
        match self {
            Report::KpiProvince => RosterSubset::Provincial,
            Report::KpiRegion => RosterSubset::Regional,
            Report::Heatmap => RosterSubset::None,
            _ => RosterSubset::All,
        }
    }

    pub fn clause_style(&self) -> ClauseStyle {
        match self {
            Report::KpiProvince | Report::KpiRegion => ClauseStyle::AndDirectory,
            Report::Heatmap => ClauseStyle::Having,
            _ => ClauseStyle::Where,
        }
    }
}

/// Workspace and project every report is scoped to. Bound as `$1` and `$2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub workspace_id: String,
    pub project_id: String,
}

/// Final query text plus the values bound to its `$N` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledQuery {
    pub sql: String,
    pub params: Vec<String>,
}
