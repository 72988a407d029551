//! Content-based scoring: keyword overlap between a user's profile
//! terms and item descriptions.
//!
//! Scores are plain occurrence counts, independent of the interaction
//! matrix; a user with no profile terms scores zero everywhere.
use rayon::prelude::*;

use data::Item;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Count whole-word, case-insensitive occurrences of `keyword` in
/// `text`.
///
/// Matches are bounded by non-word characters on both sides, so the
/// keyword "AI" is found in "AI integration" but not inside "said".
/// Multi-word keywords match as literal phrases.
pub fn occurrence_count(text: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }

    let text = text.to_lowercase();
    let keyword = keyword.to_lowercase();

    let mut count = 0;

    for (start, matched) in text.match_indices(&keyword) {
        let bounded_before = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let bounded_after = text[start + matched.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));

        if bounded_before && bounded_after {
            count += 1;
        }
    }

    count
}

/// Raw content scores for every item, in item order: the summed
/// occurrence counts of all keywords in each item's description.
pub fn score_items(items: &[Item], keywords: &[String]) -> Vec<f32> {
    items
        .par_iter()
        .map(|item| {
            keywords
                .iter()
                .map(|keyword| occurrence_count(item.description(), keyword))
                .sum::<usize>() as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_words_only() {
        assert_eq!(occurrence_count("Seeking AI integration skills", "AI"), 1);
        assert_eq!(occurrence_count("he said hello", "AI"), 0);
        assert_eq!(occurrence_count("JavaScript developer", "Java"), 0);
        assert_eq!(occurrence_count("Java and JavaScript", "Java"), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(occurrence_count("rust, Rust and RUST", "rust"), 3);
        assert_eq!(occurrence_count("Docker deployments", "dOcKeR"), 1);
    }

    #[test]
    fn multi_word_keywords_match_as_phrases() {
        assert_eq!(
            occurrence_count("Strong data analysis background", "data analysis"),
            1
        );
        assert_eq!(
            occurrence_count("data-driven analysis", "data analysis"),
            0
        );
    }

    #[test]
    fn punctuation_counts_as_a_boundary() {
        assert_eq!(occurrence_count("SQL, NoSQL and PostgreSQL.", "SQL"), 1);
        assert_eq!(occurrence_count("sql_server", "sql"), 0);
    }

    #[test]
    fn empty_keywords_score_nothing() {
        assert_eq!(occurrence_count("anything at all", ""), 0);

        let items = vec![
            Item::new(1, 0, "Machine learning engineer", 0),
            Item::new(2, 0, "Project manager", 0),
        ];
        assert_eq!(score_items(&items, &[]), vec![0.0, 0.0]);
    }

    #[test]
    fn item_scores_sum_over_keywords() {
        let items = vec![
            Item::new(1, 0, "Rust backend with SQL and more SQL", 0),
            Item::new(2, 0, "Frontend position", 0),
        ];
        let keywords = vec!["rust".to_owned(), "sql".to_owned()];

        assert_eq!(score_items(&items, &keywords), vec![3.0, 0.0]);
    }
}
