//! Question -> aspect -> domain -> maturity rollup

use indexmap::IndexMap;
use serde::Serialize;
use soc_model::{Framework, QuestionCode};
use std::collections::BTreeMap;

/// Aggregate maturity numbers for one assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    /// Mean ordinal per aspect, keyed `domain::aspect`
    pub aspect_scores: IndexMap<String, f64>,
    /// Mean aspect score per domain
    pub domain_scores: IndexMap<String, f64>,
    /// Mean domain score, rounded to 2 decimals
    pub maturity: f64,
}

/// 1-based position of `answer` in `options`
#[inline]
#[must_use]
pub fn ordinal(answer: &str, options: &[String]) -> Option<u32> {
    options
        .iter()
        .position(|o| o == answer)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// Round half away from zero to 2 decimals
#[inline]
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let len = values.len() as f64;
        values.iter().sum::<f64>() / len
    }
}

/// Compute scores for every aspect and domain in the framework
///
/// Total and pure: every aspect and domain key appears in the result, 0 when
/// nothing under it is answered.
#[must_use]
pub fn compute_scores(framework: &Framework, answers: &BTreeMap<QuestionCode, String>) -> Scores {
    let mut aspect_scores = IndexMap::with_capacity(framework.aspects.len());
    let mut per_domain: IndexMap<&str, Vec<f64>> = IndexMap::new();

    for aspect in &framework.aspects {
        let values: Vec<f64> = aspect
            .questions
            .iter()
            .filter(|q| q.is_answerable)
            .filter_map(|q| {
                let answer = answers.get(&q.code)?;
                ordinal(answer, &q.answer_options).map(f64::from)
            })
            .collect();

        let score = mean(&values);
        aspect_scores.insert(aspect.key(), score);
        per_domain.entry(aspect.domain.as_str()).or_default().push(score);
    }

    let domain_scores: IndexMap<String, f64> = per_domain
        .into_iter()
        .map(|(domain, scores)| (domain.to_string(), mean(&scores)))
        .collect();

    let domain_values: Vec<f64> = domain_scores.values().copied().collect();

    Scores {
        aspect_scores,
        domain_scores,
        maturity: round2(mean(&domain_values)),
    }
}
