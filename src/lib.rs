#![deny(missing_docs)]
//! # linkrec
//!
//! `linkrec` computes hybrid recommendations for a professional-network
//! application. Given a snapshot of users, items (feed posts or job
//! listings), weighted interaction events, and accepted friendships, it
//! ranks every item for one target user by blending
//!
//! - a collaborative score from a latent-factor model trained on the
//!   interaction matrix, and
//! - a content score from keyword overlap between the user's profile
//!   terms and item descriptions.
//!
//! The model is retrained from scratch on every request; nothing is
//! cached or persisted between calls.
//!
//! ## Example
//! ```rust
//! # extern crate linkrec;
//! use linkrec::data::{Event, EventKind, Item, ItemClass, Profile, Snapshot, User};
//! use linkrec::models::factorization::Hyperparameters;
//! use linkrec::recommender::Recommender;
//!
//! let mut snapshot = Snapshot::new(ItemClass::Listing);
//! snapshot.add_user(User::new(1, Profile::default()));
//! snapshot.add_user(User::new(2, Profile::default()));
//! snapshot.add_item(Item::new(10, 2, "Backend engineer, Rust and SQL.", 0));
//! snapshot.add_item(Item::new(11, 2, "Frontend developer, React.", 0));
//! snapshot.add_event(Event::new(1, 10, EventKind::Apply));
//!
//! let recommender = Recommender::new()
//!     .hyperparameters(Hyperparameters::new().from_seed([42; 16]));
//!
//! let ranking = recommender.recommend(&snapshot, 1).unwrap();
//!
//! assert_eq!(ranking.len(), 2);
//! assert_eq!(ranking[0].item_id, 10);
//! ```
#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate itertools;

#[macro_use]
extern crate failure;

#[macro_use]
extern crate log;

#[cfg(feature = "default")]
extern crate csv;
extern crate ndarray;
extern crate rand;
extern crate rayon;
extern crate serde;
extern crate siphasher;

pub mod content;
pub mod data;
pub mod evaluation;
#[cfg(feature = "default")]
pub mod event_log;
pub mod models;
pub mod recommender;
pub mod scoring;

/// Alias for user identifiers.
pub type UserId = usize;
/// Alias for item identifiers.
pub type ItemId = usize;
/// Alias for timestamps.
pub type Timestamp = usize;

/// Prediction error types.
#[derive(Debug, Fail)]
pub enum PredictionError {
    /// Failed prediction due to numerical issues.
    #[fail(display = "Invalid prediction value: non-finite or not a number.")]
    InvalidPredictionValue,
    /// The requested user has no row in the fitted model.
    #[fail(display = "User is not known to the fitted model.")]
    UnknownUser,
    /// The requested item has no column in the fitted model.
    #[fail(display = "Item is not known to the fitted model.")]
    UnknownItem,
}

/// Fitting error types.
#[derive(Debug, Fail)]
pub enum FittingError {
    /// Training produced NaN or infinite factor values, usually a
    /// symptom of a too-large learning rate.
    #[fail(display = "Training produced non-finite factor values.")]
    NonFiniteFactors,
    /// The cancellation signal was triggered between training steps.
    #[fail(display = "Training was interrupted by the cancellation signal.")]
    Interrupted,
}

/// Errors surfaced by the recommendation service.
#[derive(Debug, Fail)]
pub enum RecommendationError {
    /// The target user is not part of the snapshot.
    #[fail(display = "User {} is not present in the snapshot.", _0)]
    UserNotFound(UserId),
    /// Training failed; no partial ranking is produced.
    #[fail(display = "Unable to compute recommendations: {}", _0)]
    Fitting(#[fail(cause)] FittingError),
    /// Prediction failed; no partial ranking is produced.
    #[fail(display = "Unable to compute recommendations: {}", _0)]
    Prediction(#[fail(cause)] PredictionError),
}

impl From<FittingError> for RecommendationError {
    fn from(error: FittingError) -> Self {
        RecommendationError::Fitting(error)
    }
}

impl From<PredictionError> for RecommendationError {
    fn from(error: PredictionError) -> Self {
        RecommendationError::Prediction(error)
    }
}

/// Trait describing models that can score items for a known user.
pub trait RankingModel {
    /// Predict the affinity of `user_id` for each of `item_ids`, in
    /// order.
    fn predict(&self, user_id: UserId, item_ids: &[ItemId]) -> Result<Vec<f32>, PredictionError>;
}
