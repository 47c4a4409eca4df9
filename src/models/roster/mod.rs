pub mod loader;
pub mod types;

pub use loader::{load_roster, parse_roster, RosterError};
pub use types::{RosterRecord, RosterSnapshot, RosterSubset, Role, Scope};
