use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::types::{
    GENERAL_AREA, RosterRecord, RosterSnapshot, Role, SECRETARIAT_AREA, Scope,
};

pub const COL_NAME: &str = "Nama";
pub const COL_EMAIL: &str = "Akun Gmail";
pub const COL_ORGANIZATION: &str = "Asal Instansi";
pub const COL_ROLE: &str = "Jabatan Dalam Tim SE2026";

/// Role text that marks the head of a regional office.
const REGIONAL_HEAD: &str = "Kepala Kab/Kot";

/// Keyword table for roles outside the Bidang prefixes. First match wins,
/// so the vice-chair entry must precede the plain secretariat chair.
const ADMIN_ROLES: &[(&str, Role, &str)] = &[
    ("pengarah", Role::Director, GENERAL_AREA),
    ("ketua pelaksana", Role::ExecutiveChair, GENERAL_AREA),
    ("wakil ketua sekretariat", Role::SecretariatViceChair, SECRETARIAT_AREA),
    ("ketua sekretariat", Role::SecretariatChair, SECRETARIAT_AREA),
    ("anggota sekretariat", Role::SecretariatMember, SECRETARIAT_AREA),
];

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// Header lacks one of the required columns.
    Schema(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Io(e) => write!(f, "failed to open roster: {e}"),
            RosterError::Csv(e) => write!(f, "failed to read roster: {e}"),
            RosterError::Schema(col) => write!(f, "missing column {col:?} in roster csv"),
        }
    }
}

impl std::error::Error for RosterError {}

impl From<std::io::Error> for RosterError {
    fn from(e: std::io::Error) -> Self {
        RosterError::Io(e)
    }
}

impl From<csv::Error> for RosterError {
    fn from(e: csv::Error) -> Self {
        RosterError::Csv(e)
    }
}

/// A data row that carried all four required values.
#[derive(Debug)]
struct RawRow {
    name: String,
    email: String,
    organization: String,
    role_text: String,
}

/// Read and classify the roster file at `path`.
pub fn load_roster(path: impl AsRef<Path>) -> Result<RosterSnapshot, RosterError> {
    let file = File::open(path.as_ref())?;
    parse_roster(file)
}

/// Classify roster CSV from any reader.
pub fn parse_roster<R: Read>(reader: R) -> Result<RosterSnapshot, RosterError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let col = index_header(rdr.headers()?);
    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip([COL_NAME, COL_EMAIL, COL_ORGANIZATION, COL_ROLE]) {
        *slot = *col
            .get(name)
            .ok_or_else(|| RosterError::Schema(name.to_string()))?;
    }
    let [i_name, i_email, i_org, i_role] = idx;

    let mut raws = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let field = |i: usize| rec.get(i).map(str::trim).unwrap_or("");

        let name = field(i_name);
        let email = field(i_email).to_lowercase();
        let organization = field(i_org);
        let role_text = field(i_role);

        if name.is_empty() || email.is_empty() || organization.is_empty() || role_text.is_empty() {
            log::debug!("roster row {} skipped: missing required value", line + 2);
            continue;
        }

        raws.push(RawRow {
            name: name.to_string(),
            email,
            organization: organization.to_string(),
            role_text: role_text.to_string(),
        });
    }

    Ok(classify(&raws))
}

fn classify(raws: &[RawRow]) -> RosterSnapshot {
    let mut provincial = Vec::new();
    let mut areas = BTreeSet::new();

    for raw in raws {
        if derive_scope(&raw.organization) != Some(Scope::Provincial) {
            continue;
        }
        let Some((role, subject_area)) = derive_role(&raw.role_text) else {
            continue;
        };
        if role.is_subject_area_role() {
            areas.insert(subject_area.clone());
        }
        provincial.push(RosterRecord {
            email: raw.email.clone(),
            name: raw.name.clone(),
            organization: raw.organization.clone(),
            scope: Scope::Provincial,
            role,
            subject_area,
        });
    }

    let subject_areas: Vec<String> = areas.into_iter().collect();

    // Regional heads answer for every subject area.
    let mut regional = Vec::new();
    for raw in raws {
        if derive_scope(&raw.organization) != Some(Scope::Regional)
            || !raw.role_text.eq_ignore_ascii_case(REGIONAL_HEAD)
        {
            continue;
        }
        for area in &subject_areas {
            regional.push(RosterRecord {
                email: raw.email.clone(),
                name: raw.name.clone(),
                organization: raw.organization.clone(),
                scope: Scope::Regional,
                role: Role::Chair,
                subject_area: area.clone(),
            });
        }
    }

    RosterSnapshot {
        provincial,
        regional,
        subject_areas,
    }
}

fn index_header(header: &csv::StringRecord) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
        .collect()
}

/// "bps provinsi" is covered by the plain "provinsi" check.
pub fn derive_scope(organization: &str) -> Option<Scope> {
    let s = organization.to_lowercase();
    if s.contains("provinsi") {
        Some(Scope::Provincial)
    } else if s.contains("kabupaten") || s.contains("kota") || s.contains("kab/kot") {
        Some(Scope::Regional)
    } else {
        None
    }
}

/// Map role text to a normalized role and its subject area.
pub fn derive_role(role_text: &str) -> Option<(Role, String)> {
    let text = role_text.trim();
    if let Some(area) = text.strip_prefix("Ketua Bidang ") {
        return Some((Role::Chair, area.trim().to_string()));
    }
    if let Some(area) = text.strip_prefix("Anggota Bidang ") {
        return Some((Role::Member, area.trim().to_string()));
    }

    let lower = text.to_lowercase();
    ADMIN_ROLES
        .iter()
        .find(|(keyword, _, _)| lower.contains(keyword))
        .map(|(_, role, area)| (*role, area.to_string()))
}
