use std::collections::BTreeSet;

use crate::models::{AnswerValue, Questionnaire};

/// Upper bound of [`compatibility_score`]
pub const MAX_SCORE: f64 = 100.0;

/// Calculate a compatibility score (0-100) between two questionnaires
///
/// Only sub-attributes answered on both sides take part. For each of them an
/// agreement in `[0, 1]` is computed, then each side weighs those agreements
/// by its own importance:
///
/// ```text
/// side_score = Σ importance_side · agreement / Σ importance_side
/// score      = mean(side scores with non-zero total importance) · 100
/// ```
///
/// The score is symmetric, and `score(a, a)` is the maximum attainable for
/// `a`'s weights. Categories answered by one side only add neither agreement
/// nor weight.
pub fn compatibility_score(a: &Questionnaire, b: &Questionnaire) -> f64 {
    // (importance in a, importance in b, agreement) per shared sub-attribute
    let mut shared = Vec::new();

    for (name, category_a) in &a.categories {
        let Some(category_b) = b.categories.get(name) else {
            continue;
        };

        for (attribute, answer_a) in category_a {
            let Some(answer_b) = category_b.get(attribute) else {
                continue;
            };

            let agree = agreement(&answer_a.value, &answer_b.value);
            shared.push((answer_a.importance, answer_b.importance, agree));
        }
    }

    let first = Direction::weigh(shared.iter().map(|&(weight, _, agree)| (weight, agree)));
    let second = Direction::weigh(shared.iter().map(|&(_, weight, agree)| (weight, agree)));

    let score = match (first.ratio(), second.ratio()) {
        (Some(x), Some(y)) => (x + y) / 2.0,
        (Some(x), None) | (None, Some(x)) => x,
        (None, None) => 0.0,
    };

    let score = score * MAX_SCORE;
    if score.is_finite() {
        score.clamp(0.0, MAX_SCORE)
    } else {
        0.0
    }
}

/// Weighted agreement accumulated from one party's point of view
#[derive(Debug, Default, Clone, Copy)]
struct Direction {
    weighted: f64,
    total: f64,
}

impl Direction {
    /// Sum `(importance, agreement)` pairs, with every weight divided by the
    /// largest one so that the sums stay finite for huge importances.
    fn weigh<I>(answers: I) -> Self
    where
        I: Iterator<Item = (f64, f64)> + Clone,
    {
        let largest = answers
            .clone()
            .map(|(importance, _)| usable_weight(importance))
            .fold(0.0, f64::max);

        let mut direction = Self::default();
        if largest > 0.0 {
            for (importance, agreement) in answers {
                let weight = usable_weight(importance) / largest;
                direction.weighted += weight * agreement;
                direction.total += weight;
            }
        }
        direction
    }

    #[inline]
    fn ratio(&self) -> Option<f64> {
        (self.total > 0.0).then(|| self.weighted / self.total)
    }
}

/// Negative or non-finite importance counts as "doesn't care"
#[inline]
fn usable_weight(importance: f64) -> f64 {
    if importance.is_finite() && importance > 0.0 {
        importance
    } else {
        0.0
    }
}

/// Agreement between two answers in `[0, 1]`
fn agreement(a: &AnswerValue, b: &AnswerValue) -> f64 {
    match (a, b) {
        (AnswerValue::Flag(x), AnswerValue::Flag(y)) => indicator(x == y),
        (AnswerValue::Text(x), AnswerValue::Text(y)) => indicator(normalize(x) == normalize(y)),
        (AnswerValue::Number(x), AnswerValue::Number(y)) => numeric_agreement(*x, *y),
        (AnswerValue::Choices(x), AnswerValue::Choices(y)) => overlap(x, y),
        _ => 0.0,
    }
}

#[inline]
fn indicator(equal: bool) -> f64 {
    if equal {
        1.0
    } else {
        0.0
    }
}

/// Relative closeness of two numbers
///
/// Differences are scaled by the larger magnitude (at least 1) so that answers
/// on small Likert scales and larger numeric answers behave alike.
#[inline]
fn numeric_agreement(x: f64, y: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return 0.0;
    }
    let scale = x.abs().max(y.abs()).max(1.0);
    (1.0 - (x - y).abs() / scale).clamp(0.0, 1.0)
}

/// Jaccard overlap of two choice lists; two empty lists agree fully
fn overlap(x: &[String], y: &[String]) -> f64 {
    let x: BTreeSet<String> = x.iter().map(|s| normalize(s)).collect();
    let y: BTreeSet<String> = y.iter().map(|s| normalize(s)).collect();

    let union = x.union(&y).count();
    if union == 0 {
        return 1.0;
    }
    x.intersection(&y).count() as f64 / union as f64
}

/// Text answers and choices compare trimmed and case-insensitively
#[inline]
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}
