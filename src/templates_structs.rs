use askama::Template;

use crate::models::roster::RosterRecord;

/// Records shown per scope on the roster status page.
pub const SAMPLE_SIZE: usize = 3;

#[derive(Template)]
#[template(path = "debug/roster.txt")]
pub struct RosterStatusTemplate {
    pub path: String,
    pub error: Option<String>,
    pub provincial_count: usize,
    pub regional_count: usize,
    pub subject_areas: Vec<String>,
    pub provincial_sample: Vec<RosterRecord>,
    pub regional_sample: Vec<RosterRecord>,
}
