//! The request-scoped recommendation pipeline.
use content;
use data::{EventWeights, Snapshot};
use models::factorization::Hyperparameters;
use scoring::{self, BlendWeights, ScoredItem};
use {RecommendationError, UserId};

/// Orchestrates the full pipeline for one (target user, item class)
/// request: matrix construction, factorization, prediction, content
/// scoring, blending, and ranking.
///
/// A fresh model is trained on every call; nothing is shared between
/// requests. Callers wanting fewer items than the full ranking apply
/// their own truncation.
#[derive(Clone, Debug)]
pub struct Recommender {
    event_weights: EventWeights,
    blend_weights: BlendWeights,
    hyperparameters: Hyperparameters,
}

impl Recommender {
    /// Build a recommender with the default configuration.
    pub fn new() -> Self {
        Recommender {
            event_weights: EventWeights::default(),
            blend_weights: BlendWeights::default(),
            hyperparameters: Hyperparameters::new(),
        }
    }

    /// Set the interaction weight configuration.
    pub fn event_weights(mut self, weights: EventWeights) -> Self {
        self.event_weights = weights;
        self
    }

    /// Set the blend weight configuration.
    pub fn blend_weights(mut self, weights: BlendWeights) -> Self {
        self.blend_weights = weights;
        self
    }

    /// Set the factorization hyperparameters used for each request.
    pub fn hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    /// Compute the full ranking of the snapshot's items for
    /// `target_user`.
    ///
    /// An unknown target user is an error; an empty item set is an
    /// empty ranking. Training or prediction failures abort the whole
    /// request; no partial ranking is produced.
    pub fn recommend(
        &self,
        snapshot: &Snapshot,
        target_user: UserId,
    ) -> Result<Vec<ScoredItem>, RecommendationError> {
        let matrix = snapshot.interaction_matrix(target_user, &self.event_weights)?;

        debug!(
            "built {}x{} interaction matrix for user {}",
            matrix.num_users(),
            matrix.num_items(),
            target_user
        );

        // With no observed cells the factors would stay at their random
        // initialization and min-max normalization would stretch that
        // noise across [0, 1]; the contract is uniform zero scores.
        let mut collaborative = if matrix.is_all_zero() {
            vec![0.0; matrix.num_items()]
        } else {
            let model = self.hyperparameters.clone().fit(&matrix)?;
            model.raw_scores(target_user)?
        };
        scoring::min_max_normalize(&mut collaborative);

        let keywords = snapshot
            .users()
            .iter()
            .find(|user| user.id() == target_user)
            .map(|user| user.profile().keywords())
            .ok_or(RecommendationError::UserNotFound(target_user))?;

        let mut content_scores = content::score_items(snapshot.items(), &keywords);
        scoring::max_normalize(&mut content_scores);

        Ok(scoring::blend_and_rank(
            matrix.item_ids(),
            &collaborative,
            &content_scores,
            &self.blend_weights,
        ))
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Recommender::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::{Event, EventKind, EventWeights, FriendEdge, Item, ItemClass, Profile, Snapshot,
               User};
    use models::factorization::Hyperparameters;
    use RecommendationError;

    fn seeded_recommender() -> Recommender {
        Recommender::new().hyperparameters(Hyperparameters::new().from_seed([42; 16]))
    }

    #[test]
    fn missing_target_user_is_an_error() {
        let mut snapshot = Snapshot::new(ItemClass::Post);
        snapshot.add_user(User::new(1, Profile::default()));
        snapshot.add_item(Item::new(10, 1, "A post", 0));

        match seeded_recommender().recommend(&snapshot, 99) {
            Err(RecommendationError::UserNotFound(user_id)) => assert_eq!(user_id, 99),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_item_set_is_an_empty_ranking() {
        let mut snapshot = Snapshot::new(ItemClass::Listing);
        snapshot.add_user(User::new(1, Profile::default()));

        let ranking = seeded_recommender().recommend(&snapshot, 1).unwrap();
        assert!(ranking.is_empty());
    }

    #[test]
    fn cold_start_scores_are_all_zero() {
        let mut snapshot = Snapshot::new(ItemClass::Listing);
        snapshot.add_user(User::new(1, Profile::default()));
        snapshot.add_item(Item::new(12, 1, "Data engineer", 0));
        snapshot.add_item(Item::new(10, 1, "Product designer", 0));
        snapshot.add_item(Item::new(11, 1, "Accountant", 0));

        let ranking = seeded_recommender().recommend(&snapshot, 1).unwrap();

        assert_eq!(ranking.len(), 3);
        assert!(ranking.iter().all(|entry| entry.score == 0.0));

        // Nothing separates the items, so the tie-break alone orders
        // the ranking.
        let ids: Vec<_> = ranking.iter().map(|entry| entry.item_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn interactions_and_friend_signal_drive_the_ranking() {
        // Three users, four posts. The target applies to item 22; the
        // target's only friend likes item 23.
        let mut snapshot = Snapshot::new(ItemClass::Post);
        snapshot.add_user(User::new(1, Profile::default()));
        snapshot.add_user(User::new(2, Profile::default()));
        snapshot.add_user(User::new(3, Profile::default()));
        for item_id in 20..24 {
            snapshot.add_item(Item::new(item_id, 3, "A post", 0));
        }
        snapshot.add_friendship(FriendEdge::new(1, 2));
        snapshot.add_event(Event::new(1, 22, EventKind::Apply));
        snapshot.add_event(Event::new(2, 23, EventKind::Like));

        let matrix = snapshot
            .interaction_matrix(1, &EventWeights::default())
            .unwrap();
        assert_eq!(matrix.values()[[0, 2]], 2.0);
        assert_eq!(matrix.values()[[0, 3]], 3.0);

        let model = Hyperparameters::new().from_seed([42; 16]).fit(&matrix).unwrap();
        let raw = model.raw_scores(1).unwrap();

        // Directly touched cells reconstruct clearly above the noise
        // floor left by the random initialization of untouched columns.
        assert!(raw[2] > 1.0, "raw scores: {:?}", raw);
        assert!(raw[3] > 1.5, "raw scores: {:?}", raw);
        assert!(raw[0] < 0.9, "raw scores: {:?}", raw);
        assert!(raw[1] < 0.9, "raw scores: {:?}", raw);

        let ranking = seeded_recommender().recommend(&snapshot, 1).unwrap();

        assert_eq!(ranking.len(), 4);
        assert_eq!(ranking[0].item_id, 23);
        assert_eq!(ranking[1].item_id, 22);
    }

    #[test]
    fn content_overlap_breaks_collaborative_silence() {
        let mut snapshot = Snapshot::new(ItemClass::Listing);
        snapshot.add_user(User::new(
            1,
            Profile::new(vec!["Rust".to_owned()], Vec::new(), Vec::new()),
        ));
        snapshot.add_user(User::new(2, Profile::default()));
        snapshot.add_item(Item::new(30, 2, "Senior Rust developer", 0));
        snapshot.add_item(Item::new(31, 2, "Office manager", 0));

        // No events at all: the collaborative side contributes nothing
        // and the keyword overlap alone must order the ranking.
        let ranking = seeded_recommender().recommend(&snapshot, 1).unwrap();

        assert_eq!(ranking[0].item_id, 30);
        assert_eq!(ranking[0].score, 0.3);
        assert_eq!(ranking[1].score, 0.0);
    }

    #[test]
    fn rankings_are_sorted_descending() {
        let mut snapshot = Snapshot::new(ItemClass::Listing);
        for user_id in 0..4 {
            snapshot.add_user(User::new(user_id, Profile::default()));
        }
        for item_id in 0..6 {
            snapshot.add_item(Item::new(item_id, 0, "A listing", 0));
        }
        snapshot.add_event(Event::new(1, 2, EventKind::Apply));
        snapshot.add_event(Event::new(2, 4, EventKind::View));
        snapshot.add_event(Event::new(3, 4, EventKind::Comment));

        let ranking = seeded_recommender().recommend(&snapshot, 1).unwrap();

        assert_eq!(ranking.len(), 6);
        for window in ranking.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }
}
