//! File-backed survey dataset.
//!
//! A dataset is a single JSON document:
//!
//! ```json
//! {
//!   "offices": [{"id": 1, "name": "MC Kenya"}, {"id": 10, "name": "LC Nairobi", "parentId": 1}],
//!   "opportunities": [{"id": 42, "name": "Teach", "hostLc": 10, "homeMc": 1, "project": {"id": 3, "sdg": 4}}],
//!   "catalogs": {"Teach": [{"id": 1, "text": "Confidence", "initial": true, "final": true}]},
//!   "responses": [{"opportunityId": 42, "initialCount": 1, "finalCount": 1, "answers": []}]
//! }
//! ```

use super::{OpportunityDirectory, QuestionCatalog, ResponseSource, SourceError};
use crate::models::{FullSurveyResponse, Office, Opportunity, QuestionStructure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// In-memory snapshot of all survey data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub offices: Vec<Office>,

    #[serde(default)]
    pub opportunities: Vec<Opportunity>,

    /// Question catalogs keyed by opportunity name.
    #[serde(default)]
    pub catalogs: HashMap<String, Vec<QuestionStructure>>,

    #[serde(default)]
    pub responses: Vec<FullSurveyResponse>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        info!("Loading dataset from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let dataset: Dataset =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "Dataset: {} offices, {} opportunities, {} catalogs, {} responses",
            dataset.offices.len(),
            dataset.opportunities.len(),
            dataset.catalogs.len(),
            dataset.responses.len()
        );

        Ok(dataset)
    }
}

impl QuestionCatalog for Dataset {
    fn resolve_question_catalog(
        &self,
        opportunity_name: &str,
    ) -> Result<Vec<QuestionStructure>, SourceError> {
        self.catalogs
            .get(opportunity_name)
            .cloned()
            .ok_or_else(|| SourceError::CatalogNotFound(opportunity_name.to_string()))
    }
}

impl ResponseSource for Dataset {
    fn fetch_full_survey_responses(
        &self,
        opportunity_id: u64,
    ) -> Result<Vec<FullSurveyResponse>, SourceError> {
        Ok(self
            .responses
            .iter()
            .filter(|r| r.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}

impl OpportunityDirectory for Dataset {
    fn opportunity(&self, opportunity_id: u64) -> Result<Opportunity, SourceError> {
        self.opportunities
            .iter()
            .find(|o| o.id == opportunity_id)
            .cloned()
            .ok_or(SourceError::OpportunityNotFound(opportunity_id))
    }

    fn opportunities(&self) -> &[Opportunity] {
        &self.opportunities
    }

    fn offices(&self) -> &[Office] {
        &self.offices
    }
}
