//! Completion per domain

use serde::Serialize;
use soc_model::{Framework, QuestionCode};
use std::collections::BTreeMap;

/// Answered vs total answerable questions in one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainProgress {
    /// Domain name
    pub domain: String,
    /// Answerable questions
    pub total: usize,
    /// Answerable questions with a non-empty answer
    pub answered: usize,
    /// Rounded completion percentage
    pub percentage: u32,
}

/// Completion for each domain, in framework order
#[must_use]
pub fn domain_progress(
    framework: &Framework,
    answers: &BTreeMap<QuestionCode, String>,
) -> Vec<DomainProgress> {
    let mut progress: Vec<DomainProgress> = Vec::new();

    for aspect in &framework.aspects {
        let idx = match progress.iter().position(|p| p.domain == aspect.domain) {
            Some(idx) => idx,
            None => {
                progress.push(DomainProgress {
                    domain: aspect.domain.clone(),
                    total: 0,
                    answered: 0,
                    percentage: 0,
                });
                progress.len() - 1
            }
        };
        let entry = &mut progress[idx];

        for question in aspect.questions.iter().filter(|q| q.is_answerable) {
            entry.total += 1;
            if answers.get(&question.code).is_some_and(|a| !a.is_empty()) {
                entry.answered += 1;
            }
        }
    }

    for entry in &mut progress {
        entry.percentage = percentage(entry.answered, entry.total);
    }
    progress
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(answered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((answered as f64 / total as f64) * 100.0).round() as u32
}
