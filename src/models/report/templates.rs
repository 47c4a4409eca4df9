use std::fmt;
use std::path::PathBuf;

/// Named SQL template lookup.
pub trait TemplateStore: Send + Sync {
    fn load(&self, name: &str) -> Result<String, TemplateError>;
}

#[derive(Debug)]
pub enum TemplateError {
    NotFound(String),
    Io(String, std::io::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound(name) => write!(f, "sql template {name:?} not found"),
            TemplateError::Io(name, e) => write!(f, "failed to read sql template {name:?}: {e}"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

impl TemplateStore for EmbeddedTemplates {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        let sql = match name {
            "kpi_provinsi" => include_str!("../../../queries/kpi_provinsi.sql"),
            "kpi_kabkot" => include_str!("../../../queries/kpi_kabkot.sql"),
            "heatmap" => include_str!("../../../queries/heatmap.sql"),
            "issues_detail" => include_str!("../../../queries/issues_detail.sql"),
            "timeline" => include_str!("../../../queries/timeline.sql"),
            "leaderboard" => include_str!("../../../queries/leaderboard.sql"),
            "workload" => include_str!("../../../queries/workload.sql"),
            _ => return Err(TemplateError::NotFound(name.to_string())),
        };
        Ok(sql.to_string())
    }
}

/// Templates read from `<dir>/<name>.sql` on every load, so edits apply
/// without a restart.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    dir: PathBuf,
}

impl DirTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateStore for DirTemplates {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        // Names come from the fixed report set; refuse anything path-like.
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let path = self.dir.join(format!("{name}.sql"));
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TemplateError::NotFound(name.to_string()),
            _ => TemplateError::Io(name.to_string(), e),
        })
    }
}
