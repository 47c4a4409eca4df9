/// Sentinel subject area for administrative roles outside any Bidang.
pub const GENERAL_AREA: &str = "Umum";
/// Sentinel subject area shared by every secretariat role.
pub const SECRETARIAT_AREA: &str = "Sekretariat";

/// Organizational level a roster member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Provincial,
    Regional,
}

impl Scope {
    /// Value used in generated SQL and accepted by the `scope` filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Provincial => "provinsi",
            Scope::Regional => "kabkot",
        }
    }
}

/// Normalized team role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Chair,
    Member,
    Director,
    ExecutiveChair,
    SecretariatChair,
    SecretariatViceChair,
    SecretariatMember,
}

impl Role {
    /// Label as it appears in the roster and in report output.
    /// The `jabatan` filter matches against this text.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Chair => "Ketua",
            Role::Member => "Anggota",
            Role::Director => "Pengarah",
            Role::ExecutiveChair => "Ketua Pelaksana",
            Role::SecretariatChair => "Ketua Sekretariat",
            Role::SecretariatViceChair => "Wakil Ketua Sekretariat",
            Role::SecretariatMember => "Anggota Sekretariat",
        }
    }

    /// True for roles derived from a "Ketua/Anggota Bidang <X>" title.
    pub fn is_subject_area_role(&self) -> bool {
        matches!(self, Role::Chair | Role::Member)
    }
}

/// One classified roster row. Built once per load, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    pub email: String,
    pub name: String,
    pub organization: String,
    pub scope: Scope,
    pub role: Role,
    pub subject_area: String,
}

/// Classified roster: provincial staff, expanded regional heads and the
/// distinct subject areas seen among provincial Bidang roles.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub provincial: Vec<RosterRecord>,
    pub regional: Vec<RosterRecord>,
    pub subject_areas: Vec<String>,
}

impl RosterSnapshot {
    /// Provincial records followed by regional records.
    pub fn all(&self) -> impl Iterator<Item = &RosterRecord> {
        self.provincial.iter().chain(self.regional.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.provincial.is_empty() && self.regional.is_empty()
    }
}

/// Which part of the roster a report joins against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSubset {
    None,
    Provincial,
    Regional,
    All,
}

impl RosterSubset {
    pub fn select<'a>(&self, snapshot: &'a RosterSnapshot) -> Vec<&'a RosterRecord> {
        match self {
            RosterSubset::None => Vec::new(),
            RosterSubset::Provincial => snapshot.provincial.iter().collect(),
            RosterSubset::Regional => snapshot.regional.iter().collect(),
            RosterSubset::All => snapshot.all().collect(),
        }
    }
}
