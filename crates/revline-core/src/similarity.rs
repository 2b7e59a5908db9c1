//! Weighted record similarity used to rank duplicate candidates

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use crate::record::Record;

/// Titles that say nothing about the paper and recur in every issue.
const NON_DISTINCTIVE_TITLES: &[&str] = &[
    "editorial",
    "introduction",
    "preface",
    "foreword",
    "erratum",
    "corrigendum",
    "editorial introduction",
    "editors comments",
    "editors introduction",
    "letter from the editor",
    "book review",
    "reviewers",
    "acknowledgement to reviewers",
];

/// Per-component weights, in the order author, title, year, outlet,
/// volume, number.
#[derive(Debug, Clone, Copy)]
struct Weights([f64; 6]);

const ARTICLE: Weights = Weights([0.20, 0.25, 0.13, 0.20, 0.12, 0.10]);
const ARTICLE_NON_DISTINCTIVE: Weights = Weights([0.175, 0.0, 0.175, 0.175, 0.275, 0.20]);
const OTHER: Weights = Weights([0.15, 0.75, 0.05, 0.05, 0.0, 0.0]);

impl Record {
    /// Similarity in `[0, 1]`, symmetric, rounded to 4 decimals.
    ///
    /// Components absent on both sides are dropped and the remaining
    /// weights renormalised. A missing title on either side yields 0.
    pub fn get_similarity(&self, other: &Record) -> f64 {
        let (Some(t1), Some(t2)) = (self.get("title"), other.get("title")) else {
            return 0.0;
        };
        let t1 = normalize(t1);
        let t2 = normalize(t2);

        let is_article = self.entry_type == "article" || other.entry_type == "article";
        let non_distinctive = is_non_distinctive(&t1) || is_non_distinctive(&t2);
        let weights = match (is_article, non_distinctive) {
            (true, true) => ARTICLE_NON_DISTINCTIVE,
            (true, false) => ARTICLE,
            (false, _) => OTHER,
        };

        let components = [
            both_or_either(self.get("author"), other.get("author"), author_similarity),
            Some(token_set_ratio(&t1, &t2)),
            both_or_either(self.get("year"), other.get("year"), year_similarity),
            both_or_either(
                self.container_title(),
                other.container_title(),
                outlet_similarity,
            ),
            both_or_either(self.get("volume"), other.get("volume"), exact),
            both_or_either(self.get("number"), other.get("number"), exact),
        ];

        let mut total = 0.0;
        let mut weight_sum = 0.0;
        for (score, weight) in components.iter().zip(weights.0) {
            if let Some(score) = score {
                total += score * weight;
                weight_sum += weight;
            }
        }
        if weight_sum <= 0.0 {
            return 0.0;
        }
        round4((total / weight_sum).clamp(0.0, 1.0))
    }
}

/// `None` when absent on both sides, 0 when present on one, else `f`.
fn both_or_either(a: Option<&str>, b: Option<&str>, f: fn(&str, &str) -> f64) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => Some(0.0),
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Lowercase, punctuation removed, whitespace collapsed.
fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c == '\'' || c == '\u{2019}' {
                '\0'
            } else {
                ' '
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_non_distinctive(normalized_title: &str) -> bool {
    NON_DISTINCTIVE_TITLES.contains(&normalized_title)
}

/// Token-set ratio: compares the shared tokens against each side's
/// shared-plus-remaining tokens and keeps the best match.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).copied().collect::<Vec<_>>().join(" ");
    let with_rest = |rest: Vec<&str>| {
        let rest = rest.join(" ");
        match (shared.is_empty(), rest.is_empty()) {
            (true, _) => rest,
            (false, true) => shared.clone(),
            (false, false) => format!("{shared} {rest}"),
        }
    };
    let left = with_rest(ta.difference(&tb).copied().collect());
    let right = with_rest(tb.difference(&ta).copied().collect());

    let mut best = normalized_levenshtein(&left, &right);
    if !shared.is_empty() {
        best = best
            .max(normalized_levenshtein(&shared, &left))
            .max(normalized_levenshtein(&shared, &right));
    }
    best
}

/// Last names from a BibTeX-style author list ("Last, First and ...").
fn last_names(authors: &str) -> BTreeSet<String> {
    authors
        .split(" and ")
        .filter_map(|author| {
            let author = author.trim();
            let last = match author.split_once(',') {
                Some((last, _)) => last,
                None => author.split_whitespace().last().unwrap_or(""),
            };
            let last = normalize(last);
            (!last.is_empty()).then_some(last)
        })
        .collect()
}

fn author_similarity(a: &str, b: &str) -> f64 {
    let la = last_names(a);
    let lb = last_names(b);
    let union = la.union(&lb).count();
    if union == 0 {
        return 0.0;
    }
    la.intersection(&lb).count() as f64 / union as f64
}

fn year_similarity(a: &str, b: &str) -> f64 {
    match (a.trim().parse::<i32>(), b.trim().parse::<i32>()) {
        (Ok(x), Ok(y)) => match (x - y).abs() {
            0 => 1.0,
            1 => 0.5,
            _ => 0.0,
        },
        _ => exact(a, b),
    }
}

fn outlet_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b))
}

fn exact(a: &str, b: &str) -> f64 {
    if a.trim().eq_ignore_ascii_case(b.trim()) {
        1.0
    } else {
        0.0
    }
}
