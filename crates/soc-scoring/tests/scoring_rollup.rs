//! Rollup behaviour of the scoring engine.
//!
//! Covers totality (every key present, zeros when unanswered), the unweighted
//! aspect -> domain average, and determinism over arbitrary answer maps.

use proptest::prelude::*;
use soc_model::Framework;
use soc_scoring::compute_scores;
use std::collections::BTreeMap;

const SCALE: &str = r#"["Not", "Initial", "Managed", "Defined", "Optimized"]"#;

/// D1 = {A1: q1, q2, q3 (free text)}, {A2: q4}; D2 = {A3: q5}
fn framework() -> Framework {
    let json = format!(
        r#"{{"tree": {{
            "D1": {{
                "A1": [
                    {{"code": "q1", "text": "", "answer_options": {SCALE}}},
                    {{"code": "q2", "text": "", "answer_options": {SCALE}}},
                    {{"code": "q3", "text": "", "item_type": "text"}}
                ],
                "A2": [{{"code": "q4", "text": "", "answer_options": {SCALE}}}]
            }},
            "D2": {{
                "A3": [{{"code": "q5", "text": "", "answer_options": {SCALE}}}]
            }}
        }}}}"#
    );
    Framework::from_tree_json("fixture", "Fixture", &json).unwrap()
}

fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn unanswered_framework_is_all_zero_with_every_key() {
    let scores = compute_scores(&framework(), &BTreeMap::new());

    assert!(approx(scores.maturity, 0.0));
    assert_eq!(
        scores.aspect_scores.keys().collect::<Vec<_>>(),
        vec!["D1::A1", "D1::A2", "D2::A3"]
    );
    assert_eq!(scores.domain_scores.keys().collect::<Vec<_>>(), vec!["D1", "D2"]);
    assert!(scores.aspect_scores.values().all(|v| approx(*v, 0.0)));
    assert!(scores.domain_scores.values().all(|v| approx(*v, 0.0)));
}

#[test]
fn aspect_is_mean_of_answered_ordinals() {
    let scores = compute_scores(
        &framework(),
        &answers(&[("q1", "Managed"), ("q2", "Optimized")]),
    );

    assert!(approx(scores.aspect_scores["D1::A1"], 4.0));
    assert!(approx(scores.aspect_scores["D1::A2"], 0.0));
    assert!(approx(scores.domain_scores["D1"], 2.0));
    assert!(approx(scores.domain_scores["D2"], 0.0));
    assert!(approx(scores.maturity, 1.0));
}

#[test]
fn aspects_are_weighted_equally_in_domain() {
    // A1 has two answered questions, A2 one; a question-weighted mean would be
    // (1 + 1 + 5) / 3 = 2.33, the aspect mean is (1 + 5) / 2 = 3.
    let scores = compute_scores(
        &framework(),
        &answers(&[("q1", "Not"), ("q2", "Not"), ("q4", "Optimized")]),
    );
    assert!(approx(scores.domain_scores["D1"], 3.0));
}

#[test]
fn invalid_and_free_text_answers_are_excluded() {
    let scores = compute_scores(
        &framework(),
        &answers(&[("q1", "Defined"), ("q2", "bogus"), ("q3", "Optimized")]),
    );
    assert!(approx(scores.aspect_scores["D1::A1"], 4.0));
}

#[test]
fn maturity_is_mean_of_domains_rounded() {
    // A1 = 2, A2 = 0 -> D1 = 1; D2 = 2 -> maturity 1.5
    let scores = compute_scores(
        &framework(),
        &answers(&[("q1", "Initial"), ("q5", "Initial")]),
    );
    assert!(approx(scores.maturity, 1.5));

    // A1 = 2.5 -> D1 = 1.25 (unrounded); D2 = 1 -> 1.125 -> 1.13
    let scores = compute_scores(
        &framework(),
        &answers(&[("q1", "Initial"), ("q2", "Managed"), ("q5", "Not")]),
    );
    assert!(approx(scores.domain_scores["D1"], 1.25));
    assert!(approx(scores.maturity, 1.13));
}

fn answer_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    let code = prop::sample::select(vec!["q1", "q2", "q3", "q4", "q5", "zz"]);
    let value = prop::sample::select(vec![
        "Not",
        "Initial",
        "Managed",
        "Defined",
        "Optimized",
        "",
        "garbage",
    ]);
    prop::collection::btree_map(
        code.prop_map(str::to_string),
        value.prop_map(str::to_string),
        0..6,
    )
}

proptest! {
    #[test]
    fn prop_scores_are_total_bounded_and_deterministic(answers in answer_strategy()) {
        let fw = framework();
        let first = compute_scores(&fw, &answers);
        let second = compute_scores(&fw, &answers);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.aspect_scores.len(), 3);
        prop_assert_eq!(first.domain_scores.len(), 2);
        for value in first.aspect_scores.values().chain(first.domain_scores.values()) {
            prop_assert!((0.0..=5.0).contains(value));
        }
        prop_assert!((0.0..=5.0).contains(&first.maturity));
    }
}
