//! Data models for survey impact scoring.
//!
//! This module contains the core data structures shared by the data
//! source, the aggregation engine and the report generator. Field names
//! serialize in camelCase to match the JSON the surrounding system emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// A question definition from an opportunity's questionnaire template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStructure {
    /// Unique question identifier.
    pub id: u64,
    /// Display text.
    pub text: String,
    /// Asked in the "before" survey.
    #[serde(default)]
    pub initial: bool,
    /// Asked in the "after" survey.
    #[serde(default)]
    pub r#final: bool,
}

/// Survey phase an answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerType {
    /// Answer given before the opportunity.
    Initial,
    /// Answer given after the opportunity.
    Final,
    /// Any other phase tag. Carried through but never aggregated.
    #[serde(other)]
    Unknown,
}

/// A single numeric answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Question this answer refers to. May be stale.
    pub question_id: u64,
    /// Survey phase.
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    /// Numeric score.
    pub answer: f64,
}

/// One respondent's submission bundle for an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSurveyResponse {
    /// Opportunity the bundle was collected for.
    #[serde(default)]
    pub opportunity_id: u64,
    /// Application the respondent volunteered through.
    #[serde(default)]
    pub application_id: u64,
    /// Name of the slot the application belongs to.
    #[serde(default)]
    pub slot_name: String,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Weight applied to every initial-phase answer in this bundle.
    #[serde(default)]
    pub initial_count: u32,
    /// Weight applied to every final-phase answer in this bundle.
    #[serde(default)]
    pub final_count: u32,
    /// Answers, in submission order.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Light view of a response bundle, used for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponseInfo {
    pub application_id: u64,
    pub slot_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&FullSurveyResponse> for SurveyResponseInfo {
    fn from(response: &FullSurveyResponse) -> Self {
        Self {
            application_id: response.application_id,
            slot_name: response.slot_name.clone(),
            updated_at: response.updated_at,
        }
    }
}

/// An averaged score, or no data.
///
/// Arithmetic between scores propagates the no-data state: if either
/// operand has no value, neither does the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Option<f64>);

impl Score {
    /// A score with no underlying data.
    pub const NO_DATA: Score = Score(None);

    /// Wrap a computed value.
    pub fn new(value: f64) -> Self {
        Self(Some(value))
    }

    /// Weighted mean of `sum` over `count`, or no data when `count` is zero.
    pub fn mean(sum: f64, count: u64) -> Self {
        if count > 0 {
            Self(Some(sum / count as f64))
        } else {
            Self::NO_DATA
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_no_data(&self) -> bool {
        self.0.is_none()
    }

    /// Format with a fixed number of decimals, or "n/a".
    pub fn display(&self, precision: usize) -> String {
        match self.0 {
            Some(v) => format!("{:.*}", precision, v),
            None => "n/a".to_string(),
        }
    }
}

impl Sub for Score {
    type Output = Score;

    fn sub(self, rhs: Score) -> Score {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Score(Some(a - b)),
            _ => Score::NO_DATA,
        }
    }
}

/// Aggregate statistics for one catalog question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRow {
    pub id: u64,
    pub question: String,
    /// Total initial weight, absent when the question has no initial phase.
    pub total_initial_count: Option<u64>,
    pub average_initial_score: Score,
    /// Total final weight, absent when the question has no final phase.
    pub total_final_count: Option<u64>,
    pub average_final_score: Score,
    /// `average_final_score - average_initial_score`.
    pub change: Score,
}

/// Project an opportunity belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: u64,
    /// Sustainable development goal index.
    pub sdg: u32,
}

/// A volunteering opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: u64,
    /// Title; also the key of the opportunity's questionnaire catalog.
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub sdg: u32,
    /// Hosting local committee.
    pub host_lc: u64,
    /// Home member committee.
    pub home_mc: u64,
    pub project: ProjectRef,
}

/// An office in the two-level MC/LC hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Office {
    pub id: u64,
    pub name: String,
    /// Parent member committee, `None` for top-level offices.
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// `{id, name}` pair naming an office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
    pub name: String,
}

/// Host local committee and home member committee of an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEntity {
    pub lc: EntityRef,
    pub mc: EntityRef,
}

/// One line of the opportunity listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySummary {
    pub id: u64,
    pub name: String,
    pub project: ProjectRef,
    pub responses_count: usize,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub responses_analyzed: usize,
    pub questions: usize,
}

/// Summary statistics over a set of analysis rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub total_questions: usize,
    pub initial_only: usize,
    pub final_only: usize,
    pub both_phases: usize,
    pub structural: usize,
    /// Questions whose change could be computed.
    pub with_change: usize,
    pub improved: usize,
    pub declined: usize,
    pub unchanged: usize,
    /// Mean change over `with_change` questions.
    pub mean_change: Score,
}

/// The complete impact report for one opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityReport {
    pub metadata: ReportMetadata,
    pub opportunity: Opportunity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostEntity>,
    pub rows: Vec<AnalysisRow>,
    pub summary: ChangeSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_sub_propagates_no_data() {
        assert_eq!(Score::new(5.0) - Score::new(4.0), Score::new(1.0));
        assert!((Score::new(5.0) - Score::NO_DATA).is_no_data());
        assert!((Score::NO_DATA - Score::new(4.0)).is_no_data());
        assert!((Score::NO_DATA - Score::NO_DATA).is_no_data());
    }

    #[test]
    fn test_score_mean_guards_zero_count() {
        assert_eq!(Score::mean(20.0, 4), Score::new(5.0));
        assert!(Score::mean(0.0, 0).is_no_data());
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::new(1.0 / 3.0).display(2), "0.33");
        assert_eq!(Score::NO_DATA.display(2), "n/a");
    }

    #[test]
    fn test_score_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Score::NO_DATA).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Score::new(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn test_answer_type_unknown_tag() {
        let answer: Answer =
            serde_json::from_str(r#"{"questionId": 3, "type": "MIDTERM", "answer": 2}"#).unwrap();
        assert_eq!(answer.answer_type, AnswerType::Unknown);
        assert_eq!(answer.question_id, 3);
    }

    #[test]
    fn test_response_camel_case() {
        let json = r#"{
            "initialCount": 2,
            "finalCount": 1,
            "answers": [
                {"questionId": 1, "type": "INITIAL", "answer": 4},
                {"questionId": 1, "type": "FINAL", "answer": 5}
            ]
        }"#;
        let response: FullSurveyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.initial_count, 2);
        assert_eq!(response.final_count, 1);
        assert_eq!(response.answers.len(), 2);
        assert_eq!(response.answers[1].answer_type, AnswerType::Final);
        assert!(response.updated_at.is_none());
    }

    #[test]
    fn test_question_final_flag_name() {
        let q = QuestionStructure {
            id: 1,
            text: "Section header".to_string(),
            initial: false,
            r#final: false,
        };
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"final\":false"));
    }
}
