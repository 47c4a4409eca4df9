pub mod assembler;
pub mod encoder;
pub mod executor;
pub mod service;
pub mod templates;
pub mod types;

pub use assembler::{AssembleError, assemble, cache_key, quote_literal};
pub use encoder::encode_csv;
pub use executor::{PgExecutor, QueryError, QueryExecutor, ResultSet};
pub use service::{ReportError, ReportService};
pub use templates::{DirTemplates, EmbeddedTemplates, TemplateError, TemplateStore};
pub use types::{AssembledQuery, ClauseStyle, FilterName, FilterSet, ProjectScope, Report};
