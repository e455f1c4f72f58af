//! Survey answer aggregation and change statistics.
//!
//! This module folds survey response bundles into one weighted-average row
//! per catalog question and computes summary statistics over those rows.

use crate::models::{
    AnalysisRow, AnswerType, ChangeSummary, FullSurveyResponse, QuestionStructure, Score,
};
use std::collections::HashMap;

/// Running sums for one question.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum_initial_count: u64,
    sum_initial_score: f64,
    sum_final_count: u64,
    sum_final_score: f64,
}

/// Compute one analysis row per catalog question, in catalog order.
///
/// Every answer is weighted by its bundle's `initial_count` or
/// `final_count`, not counted once. Answers for question ids outside the
/// catalog and answers with an unknown phase are skipped.
pub fn compute_analysis(
    catalog: &[QuestionStructure],
    responses: &[FullSurveyResponse],
) -> Vec<AnalysisRow> {
    // Key set is fixed before any response is folded in.
    let mut sums: HashMap<u64, Accumulator> = catalog
        .iter()
        .map(|q| (q.id, Accumulator::default()))
        .collect();

    for response in responses {
        for answer in &response.answers {
            let Some(acc) = sums.get_mut(&answer.question_id) else {
                continue;
            };

            match answer.answer_type {
                AnswerType::Initial => {
                    let weight = u64::from(response.initial_count);
                    acc.sum_initial_count += weight;
                    acc.sum_initial_score += weight as f64 * answer.answer;
                }
                AnswerType::Final => {
                    let weight = u64::from(response.final_count);
                    acc.sum_final_count += weight;
                    acc.sum_final_score += weight as f64 * answer.answer;
                }
                AnswerType::Unknown => {}
            }
        }
    }

    catalog
        .iter()
        .map(|question| {
            let acc = sums.get(&question.id).copied().unwrap_or_default();

            let (total_initial_count, average_initial_score) = if question.initial {
                (
                    Some(acc.sum_initial_count),
                    Score::mean(acc.sum_initial_score, acc.sum_initial_count),
                )
            } else {
                (None, Score::NO_DATA)
            };

            let (total_final_count, average_final_score) = if question.r#final {
                (
                    Some(acc.sum_final_count),
                    Score::mean(acc.sum_final_score, acc.sum_final_count),
                )
            } else {
                (None, Score::NO_DATA)
            };

            AnalysisRow {
                id: question.id,
                question: question.text.clone(),
                total_initial_count,
                average_initial_score,
                total_final_count,
                average_final_score,
                change: average_final_score - average_initial_score,
            }
        })
        .collect()
}

/// Summarize applicability and change direction across rows.
pub fn summarize(catalog: &[QuestionStructure], rows: &[AnalysisRow]) -> ChangeSummary {
    let mut summary = ChangeSummary {
        total_questions: catalog.len(),
        ..ChangeSummary::default()
    };

    for question in catalog {
        match (question.initial, question.r#final) {
            (true, true) => summary.both_phases += 1,
            (true, false) => summary.initial_only += 1,
            (false, true) => summary.final_only += 1,
            (false, false) => summary.structural += 1,
        }
    }

    let mut change_sum = 0.0;
    for change in rows.iter().filter_map(|r| r.change.value()) {
        summary.with_change += 1;
        change_sum += change;

        if change > 0.0 {
            summary.improved += 1;
        } else if change < 0.0 {
            summary.declined += 1;
        } else {
            summary.unchanged += 1;
        }
    }

    summary.mean_change = if summary.with_change > 0 {
        Score::new(change_sum / summary.with_change as f64)
    } else {
        Score::NO_DATA
    };

    summary
}

/// Get the `n` rows with the largest absolute change.
///
/// Rows without a computable change are left out.
pub fn largest_changes(rows: &[AnalysisRow], n: usize) -> Vec<&AnalysisRow> {
    let mut changed: Vec<(&AnalysisRow, f64)> = rows
        .iter()
        .filter_map(|r| r.change.value().map(|c| (r, c.abs())))
        .collect();

    changed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    changed.truncate(n);

    changed.into_iter().map(|(row, _)| row).collect()
}
