//! Score normalization, blending, and deterministic ranking.
use std;
use std::cmp::Ordering;

use ItemId;

/// Weights for blending the collaborative and content scores. They are
/// not required to sum to 1.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlendWeights {
    /// Multiplier for the normalized collaborative score.
    pub collaborative: f32,
    /// Multiplier for the normalized content score.
    pub content: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights {
            collaborative: 0.7,
            content: 0.3,
        }
    }
}

/// One entry of a ranking: an item id with its final blended score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// The ranked item.
    pub item_id: ItemId,
    /// The blended score the ranking is sorted by.
    pub score: f32,
}

/// Rescale scores into [0, 1] by min-max normalization. When all
/// values are equal (an all-zero matrix, for instance) every output is
/// exactly 0.
pub fn min_max_normalize(scores: &mut [f32]) {
    let min = scores.iter().cloned().fold(std::f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(std::f32::NEG_INFINITY, f32::max);

    if max > min {
        for score in scores.iter_mut() {
            *score = (*score - min) / (max - min);
        }
    } else {
        for score in scores.iter_mut() {
            *score = 0.0;
        }
    }
}

/// Rescale non-negative scores into [0, 1] by dividing by the maximum.
/// When the maximum is not positive every output is exactly 0.
pub fn max_normalize(scores: &mut [f32]) {
    let max = scores.iter().cloned().fold(0.0_f32, f32::max);

    if max > 0.0 {
        for score in scores.iter_mut() {
            *score /= max;
        }
    } else {
        for score in scores.iter_mut() {
            *score = 0.0;
        }
    }
}

/// Blend two normalized score vectors and produce the final ranking:
/// descending by blended score, ties broken by ascending item id.
pub fn blend_and_rank(
    item_ids: &[ItemId],
    collaborative: &[f32],
    content: &[f32],
    weights: &BlendWeights,
) -> Vec<ScoredItem> {
    debug_assert_eq!(item_ids.len(), collaborative.len());
    debug_assert_eq!(item_ids.len(), content.len());

    let mut ranking: Vec<ScoredItem> = izip!(item_ids, collaborative, content)
        .map(|(&item_id, &collaborative, &content)| ScoredItem {
            item_id: item_id,
            score: weights.collaborative * collaborative + weights.content * content,
        })
        .collect();

    ranking.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(Ordering::Equal)
            .then(x.item_id.cmp(&y.item_id))
    });

    ranking
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_normalization_bounds() {
        let mut scores = vec![3.0, 1.0, 2.0];
        min_max_normalize(&mut scores);

        assert_eq!(scores, vec![1.0, 0.0, 0.5]);
        assert!(scores.iter().all(|&x| 0.0 <= x && x <= 1.0));
    }

    #[test]
    fn equal_scores_normalize_to_zero() {
        let mut scores = vec![2.0, 2.0, 2.0];
        min_max_normalize(&mut scores);
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);

        let mut empty: Vec<f32> = Vec::new();
        min_max_normalize(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn max_normalization_guards_zero_maximum() {
        let mut scores = vec![1.0, 4.0];
        max_normalize(&mut scores);
        assert_eq!(scores, vec![0.25, 1.0]);

        let mut zeros = vec![0.0, 0.0];
        max_normalize(&mut zeros);
        assert_eq!(zeros, vec![0.0, 0.0]);
    }

    #[test]
    fn blend_arithmetic() {
        let ranking = blend_and_rank(
            &[0, 1],
            &[1.0, 0.0],
            &[0.0, 1.0],
            &BlendWeights::default(),
        );

        assert_eq!(ranking[0].item_id, 0);
        assert_eq!(ranking[0].score, 0.7);
        assert_eq!(ranking[1].item_id, 1);
        assert_eq!(ranking[1].score, 0.3);
    }

    #[test]
    fn ties_break_by_ascending_item_id() {
        let ranking = blend_and_rank(
            &[7, 3, 5],
            &[0.5, 0.5, 0.9],
            &[0.0, 0.0, 0.0],
            &BlendWeights::default(),
        );

        let ids: Vec<_> = ranking.iter().map(|x| x.item_id).collect();
        assert_eq!(ids, vec![5, 3, 7]);
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let weights = BlendWeights {
            collaborative: 2.0,
            content: 1.0,
        };
        let ranking = blend_and_rank(&[0], &[0.5], &[0.5], &weights);

        assert_eq!(ranking[0].score, 1.5);
    }
}
