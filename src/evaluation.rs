//! Ranking quality diagnostics.
use std::collections::HashMap;

use rayon::prelude::*;

use data::Event;
use {ItemId, PredictionError, RankingModel, UserId};

/// Mean reciprocal rank of held-out events under `model`, scoring
/// every user against the full `item_ids` candidate set.
///
/// Users absent from the model and held-out items outside the
/// candidate set are skipped; an empty evaluation scores 0.
pub fn mrr_score<T: RankingModel + Sync>(
    model: &T,
    test: &[Event],
    item_ids: &[ItemId],
) -> Result<f32, PredictionError> {
    let mut held_out: HashMap<UserId, Vec<ItemId>> = HashMap::new();
    for event in test {
        held_out
            .entry(event.user_id())
            .or_insert_with(Vec::new)
            .push(event.item_id());
    }
    let held_out: Vec<(UserId, Vec<ItemId>)> = held_out.into_iter().collect();

    let mrrs: Result<Vec<f32>, PredictionError> = held_out
        .par_iter()
        .filter_map(|&(user_id, ref held_items)| {
            let predictions = match model.predict(user_id, item_ids) {
                Ok(predictions) => predictions,
                Err(PredictionError::UnknownUser) => return None,
                Err(error) => return Some(Err(error)),
            };

            let mut reciprocal_sum = 0.0;
            let mut counted = 0;

            for held in held_items {
                let held_position = match item_ids.iter().position(|x| x == held) {
                    Some(position) => position,
                    None => continue,
                };
                let held_score = predictions[held_position];
                let rank = predictions.iter().filter(|&&x| x >= held_score).count();

                reciprocal_sum += 1.0 / rank as f32;
                counted += 1;
            }

            if counted == 0 {
                None
            } else {
                Some(Ok(reciprocal_sum / counted as f32))
            }
        })
        .collect();
    let mrrs = mrrs?;

    if mrrs.is_empty() {
        return Ok(0.0);
    }

    Ok(mrrs.iter().sum::<f32>() / mrrs.len() as f32)
}
