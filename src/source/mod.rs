//! Survey data sources.
//!
//! The aggregation engine never talks to storage. Everything it needs is
//! resolved up front through the traits in this module; `dataset` provides
//! the file-backed implementation used by the CLI.

pub mod dataset;

pub use dataset::Dataset;

use crate::models::{FullSurveyResponse, Office, Opportunity, QuestionStructure};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving survey data.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("opportunity not found: {0}")]
    OpportunityNotFound(u64),

    #[error("no question catalog for opportunity `{0}`")]
    CatalogNotFound(String),

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolves the ordered question catalog of an opportunity's questionnaire.
pub trait QuestionCatalog {
    /// Returns the catalog in its stored order, or `CatalogNotFound`.
    fn resolve_question_catalog(
        &self,
        opportunity_name: &str,
    ) -> Result<Vec<QuestionStructure>, SourceError>;
}

/// Supplies the complete set of response bundles for an opportunity.
pub trait ResponseSource {
    fn fetch_full_survey_responses(
        &self,
        opportunity_id: u64,
    ) -> Result<Vec<FullSurveyResponse>, SourceError>;
}

/// Looks up opportunities and the office hierarchy.
pub trait OpportunityDirectory {
    fn opportunity(&self, opportunity_id: u64) -> Result<Opportunity, SourceError>;

    fn opportunities(&self) -> &[Opportunity];

    fn offices(&self) -> &[Office];
}
