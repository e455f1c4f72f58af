//! Opportunity-level workflows.
//!
//! Resolves an opportunity's catalog and responses through the source
//! traits, runs the aggregation engine, and builds listings over the
//! office hierarchy.

use crate::analysis::{compute_analysis, summarize};
use crate::models::{
    EntityRef, HostEntity, Office, Opportunity, OpportunityReport, OpportunitySummary,
    ReportMetadata, SurveyResponseInfo,
};
use crate::source::{OpportunityDirectory, QuestionCatalog, ResponseSource, SourceError};
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Expand entity ids to themselves plus every office directly under them.
///
/// Ids that do not name a known office are kept as-is.
pub fn child_lcs(offices: &[Office], entities: &[u64]) -> Vec<u64> {
    let mut expanded: Vec<u64> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    for &entity in entities {
        if seen.insert(entity) {
            expanded.push(entity);
        }

        for office in offices.iter().filter(|o| o.parent_id == Some(entity)) {
            if seen.insert(office.id) {
                expanded.push(office.id);
            }
        }
    }

    expanded
}

/// Opportunities hosted by one of `entities` (expanded to child LCs), or
/// all opportunities when no filter is given.
pub fn filter_opportunities<'a, D>(source: &'a D, entities: Option<&[u64]>) -> Vec<&'a Opportunity>
where
    D: OpportunityDirectory,
{
    match entities {
        None => source.opportunities().iter().collect(),
        Some(entities) => {
            let lcs: HashSet<u64> = child_lcs(source.offices(), entities).into_iter().collect();
            debug!("Entity filter expanded to {} offices", lcs.len());

            source
                .opportunities()
                .iter()
                .filter(|o| lcs.contains(&o.host_lc))
                .collect()
        }
    }
}

/// List opportunities with their response counts.
pub fn list_opportunities<S>(source: &S, entities: Option<&[u64]>) -> Result<Vec<OpportunitySummary>>
where
    S: OpportunityDirectory + ResponseSource,
{
    let mut summaries = Vec::new();

    for opportunity in filter_opportunities(source, entities) {
        let responses = source
            .fetch_full_survey_responses(opportunity.id)
            .with_context(|| format!("Failed to fetch responses for opportunity {}", opportunity.id))?;

        summaries.push(OpportunitySummary {
            id: opportunity.id,
            name: opportunity.name.clone(),
            project: opportunity.project.clone(),
            responses_count: responses.len(),
        });
    }

    Ok(summaries)
}

/// Light listing of every response bundle of an opportunity.
pub fn survey_responses<S>(source: &S, opportunity_id: u64) -> Result<Vec<SurveyResponseInfo>>
where
    S: OpportunityDirectory + ResponseSource,
{
    source.opportunity(opportunity_id)?;

    let responses = source.fetch_full_survey_responses(opportunity_id)?;
    Ok(responses.iter().map(SurveyResponseInfo::from).collect())
}

/// Look up the host LC and home MC of an opportunity.
pub fn host_entity<D: OpportunityDirectory>(source: &D, opportunity_id: u64) -> Result<HostEntity> {
    let opportunity = source.opportunity(opportunity_id)?;
    let offices = source.offices();

    let entity = |id: u64| -> Result<EntityRef> {
        offices
            .iter()
            .find(|o| o.id == id)
            .map(|o| EntityRef {
                id: o.id,
                name: o.name.clone(),
            })
            .with_context(|| format!("Office {} of opportunity {} not found", id, opportunity_id))
    };

    Ok(HostEntity {
        lc: entity(opportunity.host_lc)?,
        mc: entity(opportunity.home_mc)?,
    })
}

/// Resolve, aggregate and summarize one opportunity.
///
/// A missing catalog is not fatal: the opportunity is reported with no rows.
pub fn analyze_opportunity<S>(
    source: &S,
    opportunity_id: u64,
    dataset_label: &str,
) -> Result<OpportunityReport>
where
    S: OpportunityDirectory + QuestionCatalog + ResponseSource,
{
    let opportunity = source.opportunity(opportunity_id)?;
    info!("Analyzing opportunity {} ({})", opportunity.id, opportunity.name);

    let catalog = match source.resolve_question_catalog(&opportunity.name) {
        Ok(catalog) => catalog,
        Err(SourceError::CatalogNotFound(name)) => {
            warn!("No question catalog for `{}`; reporting no rows", name);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let responses = source
        .fetch_full_survey_responses(opportunity_id)
        .with_context(|| format!("Failed to fetch responses for opportunity {}", opportunity_id))?;
    debug!(
        "{} questions, {} response bundles",
        catalog.len(),
        responses.len()
    );

    let rows = compute_analysis(&catalog, &responses);
    let summary = summarize(&catalog, &rows);

    let host = match host_entity(source, opportunity_id) {
        Ok(host) => Some(host),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    Ok(OpportunityReport {
        metadata: ReportMetadata {
            dataset: dataset_label.to_string(),
            generated_at: Utc::now(),
            responses_analyzed: responses.len(),
            questions: catalog.len(),
        },
        opportunity,
        host,
        rows,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;
    use crate::source::dataset::tests::sample;

    #[test]
    fn test_child_lcs_expands_member_committees() {
        let dataset = sample();
        assert_eq!(child_lcs(&dataset.offices, &[1]), vec![1, 10, 11]);
        assert_eq!(child_lcs(&dataset.offices, &[20]), vec![20]);
        assert_eq!(child_lcs(&dataset.offices, &[1, 10, 2]), vec![1, 10, 11, 2, 20]);
        assert_eq!(child_lcs(&dataset.offices, &[999]), vec![999]);
    }

    #[test]
    fn test_list_opportunities() {
        let dataset = sample();
        let listing = list_opportunities(&dataset, None).unwrap();

        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].id, 42);
        assert_eq!(listing[0].responses_count, 2);
        assert_eq!(listing[1].responses_count, 1);
        assert_eq!(listing[2].responses_count, 0);
        assert_eq!(listing[2].project.sdg, 13);
    }

    #[test]
    fn test_list_opportunities_filtered() {
        let dataset = sample();

        let kenya = list_opportunities(&dataset, Some(&[1][..])).unwrap();
        let ids: Vec<u64> = kenya.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![42, 43]);

        let accra = list_opportunities(&dataset, Some(&[20][..])).unwrap();
        assert_eq!(accra.len(), 1);
        assert_eq!(accra[0].name, "Green Accra");
    }

    #[test]
    fn test_survey_responses() {
        let dataset = sample();
        let responses = survey_responses(&dataset, 42).unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].application_id, 100);
        assert_eq!(responses[0].slot_name, "July");
        assert!(responses[0].updated_at.is_some());
        assert!(survey_responses(&dataset, 1234).is_err());
    }

    #[test]
    fn test_host_entity() {
        let host = host_entity(&sample(), 43).unwrap();
        assert_eq!(host.lc.name, "LC Mombasa");
        assert_eq!(host.mc.id, 1);
        assert_eq!(host.mc.name, "MC Kenya");
    }

    #[test]
    fn test_analyze_opportunity() {
        let report = analyze_opportunity(&sample(), 42, "sample.json").unwrap();

        assert_eq!(report.metadata.responses_analyzed, 2);
        assert_eq!(report.metadata.questions, 3);
        assert_eq!(report.rows.len(), 3);

        let confidence = &report.rows[0];
        assert_eq!(confidence.total_initial_count, Some(2));
        assert_eq!(confidence.average_initial_score, Score::new(4.0));
        assert_eq!(confidence.average_final_score, Score::new(5.0));
        assert_eq!(confidence.change, Score::new(1.0));

        let background = &report.rows[1];
        assert_eq!(background.total_initial_count, Some(0));
        assert_eq!(background.total_final_count, None);
        assert!(background.average_initial_score.is_no_data());

        let skills = &report.rows[2];
        assert_eq!(skills.total_initial_count, Some(1));
        assert_eq!(skills.total_final_count, Some(0));
        assert!(skills.change.is_no_data());

        assert_eq!(report.summary.with_change, 1);
        assert_eq!(report.host.unwrap().lc.name, "LC Nairobi");
    }

    #[test]
    fn test_analyze_without_catalog() {
        let report = analyze_opportunity(&sample(), 43, "sample.json").unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.metadata.responses_analyzed, 1);
        assert_eq!(report.summary.total_questions, 0);
    }

    #[test]
    fn test_analyze_unknown_opportunity() {
        let err = analyze_opportunity(&sample(), 7, "sample.json").unwrap_err();
        assert!(err.to_string().contains("opportunity not found: 7"));
    }
}
