use std::collections::{HashMap, HashSet};
use std::fmt;

use super::types::{AssembledQuery, ClauseStyle, FilterSet, ProjectScope, Report};
use crate::models::roster::{RosterRecord, RosterSnapshot};

/// Separator between the report name and each filter value in a cache key.
pub const KEY_DELIMITER: &str = "_";

/// Rendered for a lookup fragment with no records; keeps `CASE` well formed.
const NEVER_MATCHES: &str = "      WHEN false THEN NULL";

/// Rendered for an empty identity list. `x IN (NULL)` is never true.
const NO_IDENTITY: &str = "NULL";

/// Rendered for an empty subject-area row list.
const NO_SUBJECT_AREA: &str = "(NULL::text)";

/// `$1` and `$2` are the workspace and project ids.
const FIXED_PARAMS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// A `{{TOKEN}}` survived substitution.
    UnresolvedPlaceholder(String),
    /// Filters are active but the template has nowhere to put them.
    MissingPlaceholder(&'static str),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::UnresolvedPlaceholder(p) => {
                write!(f, "template placeholder {p} has no generated fragment")
            }
            AssembleError::MissingPlaceholder(p) => {
                write!(f, "template is missing placeholder {p}")
            }
        }
    }
}

impl std::error::Error for AssembleError {}

/// Double embedded single quotes so `s` can sit inside `'...'`.
pub fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Cache key: report name, then each active filter value in canonical order.
pub fn cache_key(report_name: &str, filters: &FilterSet) -> String {
    let mut key = report_name.to_string();
    for (_, value) in filters.active() {
        key.push_str(KEY_DELIMITER);
        key.push_str(value);
    }
    key
}

/// One `WHEN` arm per record mapping its email to `value(record)`.
pub fn lookup_cases<F>(records: &[&RosterRecord], value: F) -> String
where
    F: Fn(&RosterRecord) -> &str,
{
    if records.is_empty() {
        return NEVER_MATCHES.to_string();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "      WHEN LOWER(u.email) = '{}' THEN '{}'",
                quote_literal(&r.email),
                quote_literal(value(r))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quoted, de-duplicated email list for `IN (...)` predicates.
pub fn identity_list(records: &[&RosterRecord]) -> String {
    let mut seen = HashSet::new();
    let emails: Vec<&str> = records
        .iter()
        .map(|r| r.email.as_str())
        .filter(|e| seen.insert(*e))
        .collect();
    if emails.is_empty() {
        return NO_IDENTITY.to_string();
    }
    emails
        .iter()
        .map(|e| format!("'{}'", quote_literal(e)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `VALUES` rows, one per subject area.
pub fn subject_area_rows(areas: &[String]) -> String {
    if areas.is_empty() {
        return NO_SUBJECT_AREA.to_string();
    }
    areas
        .iter()
        .map(|a| format!("('{}')", quote_literal(a)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parameterized filter clause. Values are returned for binding, starting
/// at `$param_offset + 1`; none of them is spliced into the SQL.
pub fn build_filter_clause(
    filters: &FilterSet,
    style: ClauseStyle,
    param_offset: usize,
) -> (String, Vec<String>) {
    let mut parts = Vec::new();
    let mut params = Vec::new();
    for (name, value) in filters.active() {
        let n = param_offset + params.len() + 1;
        let col = match style {
            ClauseStyle::AndDirectory => format!("d.{}", name.param()),
            _ => name.param().to_string(),
        };
        parts.push(format!("{col} = ${n}"));
        params.push(value.to_string());
    }

    if parts.is_empty() {
        return (String::new(), params);
    }

    let sql = match style {
        ClauseStyle::Where => format!("\nWHERE\n  {}", parts.join("\n  AND ")),
        ClauseStyle::Having => format!("\nHAVING\n  {}", parts.join("\n  AND ")),
        ClauseStyle::AndDirectory => format!("\n  AND {}", parts.join("\n  AND ")),
    };
    (sql, params)
}

fn clause_placeholder(style: ClauseStyle) -> &'static str {
    match style {
        ClauseStyle::Having => "{{HAVING_CLAUSE}}",
        _ => "{{WHERE_CLAUSE}}",
    }
}

/// Substitute every generated fragment into `template`.
pub fn assemble(
    template: &str,
    report: Report,
    filters: &FilterSet,
    roster: &RosterSnapshot,
    scope: &ProjectScope,
) -> Result<AssembledQuery, AssembleError> {
    let records = report.roster_subset().select(roster);
    let style = report.clause_style();
    let (clause, filter_params) = build_filter_clause(filters, style, FIXED_PARAMS);
    let clause_token = clause_placeholder(style);

    if !clause.is_empty() && !template.contains(clause_token) {
        return Err(AssembleError::MissingPlaceholder(clause_token));
    }

    let fragment = |token: &str| -> Option<String> {
        let sql = match token {
            "{{NAMA_CASES}}" => lookup_cases(&records, |r| r.name.as_str()),
            "{{SCOPE_CASES}}" => lookup_cases(&records, |r| r.scope.as_str()),
            "{{INSTANSI_CASES}}" => lookup_cases(&records, |r| r.organization.as_str()),
            "{{BIDANG_CASES}}" => lookup_cases(&records, |r| r.subject_area.as_str()),
            "{{JABATAN_CASES}}" => lookup_cases(&records, |r| r.role.label()),
            "{{EMAILS}}" => identity_list(&records),
            "{{SUBJECT_AREAS}}" => subject_area_rows(&roster.subject_areas),
            t if t == clause_token => clause.clone(),
            _ => return None,
        };
        Some(sql)
    };

    // One pass over the template. Inserted fragments are copied through
    // untouched, so roster text that looks like a token stays literal.
    let mut rendered: HashMap<&str, String> = HashMap::new();
    let mut sql = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        sql.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find("}}").map(|e| e + 2) else {
            return Err(AssembleError::UnresolvedPlaceholder(tail.to_string()));
        };
        let token = &tail[..end];
        if !rendered.contains_key(token) {
            let text = fragment(token)
                .ok_or_else(|| AssembleError::UnresolvedPlaceholder(token.to_string()))?;
            rendered.insert(token, text);
        }
        sql.push_str(&rendered[token]);
        rest = &tail[end..];
    }
    sql.push_str(rest);

    let mut params = Vec::with_capacity(FIXED_PARAMS + filter_params.len());
    params.push(scope.workspace_id.clone());
    params.push(scope.project_id.clone());
    params.extend(filter_params);

    Ok(AssembledQuery { sql, params })
}
