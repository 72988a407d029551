//! Latent-factor collaborative filtering.
//!
//! The interaction matrix is factorized into user and item factor
//! matrices by stochastic gradient descent over the observed (nonzero)
//! cells only; unobserved cells are treated as missing, not as
//! negative preference. The fitted factors reconstruct a per-item
//! affinity score for any user row via dot products.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;
use rand::distributions::{Distribution, Uniform};
use rand::{thread_rng, Rng, SeedableRng, XorShiftRng};

use data::InteractionMatrix;
use {FittingError, ItemId, PredictionError, RankingModel, UserId};

fn factor_init<T: Rng>(rows: usize, cols: usize, rng: &mut T) -> Array2<f32> {
    let uniform = Uniform::new(0.0, 0.1);
    Array2::from_shape_fn((rows, cols), |_| uniform.sample(rng))
}

/// Hyperparameters for fitting the factorization model.
#[derive(Clone, Debug)]
pub struct Hyperparameters {
    latent_dim: usize,
    num_steps: usize,
    learning_rate: f32,
    rng: XorShiftRng,
    stop: Option<Arc<AtomicBool>>,
}

impl Hyperparameters {
    /// Build new hyperparameters with the pipeline defaults.
    pub fn new() -> Self {
        Hyperparameters {
            latent_dim: 10,
            num_steps: 1000,
            learning_rate: 0.002,
            rng: XorShiftRng::from_seed(thread_rng().gen()),
            stop: None,
        }
    }

    /// Set the number of latent dimensions.
    pub fn latent_dim(mut self, latent_dim: usize) -> Self {
        self.latent_dim = latent_dim;
        self
    }

    /// Set the number of gradient descent steps. Training always runs
    /// for exactly this many steps; there is no convergence check.
    pub fn num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    /// Set the learning rate.
    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the random number generator.
    pub fn rng(mut self, rng: XorShiftRng) -> Self {
        self.rng = rng;
        self
    }

    /// Set the random number generator from seed.
    pub fn from_seed(mut self, seed: [u8; 16]) -> Self {
        self.rng = XorShiftRng::from_seed(seed);
        self
    }

    /// Install a cancellation flag. It is checked between steps; once
    /// set, fitting fails with [`FittingError::Interrupted`].
    pub fn stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Factorize `matrix` into a fitted model.
    ///
    /// Factors are initialized with uniform values in [0, 0.1). Each
    /// step walks the observed cells in row-major order and, per cell
    /// and latent dimension, updates the user factor entry from the old
    /// item factor entry, then the item factor entry from the
    /// just-updated user factor entry. The asymmetry is part of the
    /// model's contract; both orderings converge, but to different
    /// factors.
    ///
    /// Any non-finite factor value after the final step fails the fit
    /// rather than letting garbage flow into a ranking.
    pub fn fit(mut self, matrix: &InteractionMatrix) -> Result<FactorizationModel, FittingError> {
        let (num_users, num_items) = matrix.shape();
        let triplets = matrix.to_triplets();

        let mut user_factors = factor_init(num_users, self.latent_dim, &mut self.rng);
        let mut item_factors = factor_init(num_items, self.latent_dim, &mut self.rng);
        let mut loss = 0.0;

        for step in 0..self.num_steps {
            if let Some(ref stop) = self.stop {
                if stop.load(Ordering::Relaxed) {
                    return Err(FittingError::Interrupted);
                }
            }

            loss = 0.0;

            for &(row, column, value) in &triplets {
                let predicted = user_factors.row(row).dot(&item_factors.row(column));
                let error = value - predicted;
                loss += error * error;

                for dim in 0..self.latent_dim {
                    user_factors[[row, dim]] +=
                        self.learning_rate * error * item_factors[[column, dim]];
                    item_factors[[column, dim]] +=
                        self.learning_rate * error * user_factors[[row, dim]];
                }
            }

            trace!("step {}: squared error {}", step, loss);
        }

        if !user_factors
            .iter()
            .chain(item_factors.iter())
            .all(|x| x.is_finite())
        {
            return Err(FittingError::NonFiniteFactors);
        }

        debug!(
            "fitted {}x{} interactions at dim {}: final squared error {}",
            num_users, num_items, self.latent_dim, loss
        );

        Ok(FactorizationModel {
            user_ids: matrix.user_ids().to_owned(),
            item_ids: matrix.item_ids().to_owned(),
            user_index: index_of(matrix.user_ids()),
            item_index: index_of(matrix.item_ids()),
            user_factors: user_factors,
            item_factors: item_factors,
            loss: loss,
        })
    }
}

fn index_of(ids: &[usize]) -> HashMap<usize, usize> {
    ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect()
}

/// A fitted latent-factor model. Request-scoped: built, used for one
/// prediction pass, and discarded.
#[derive(Clone, Debug)]
pub struct FactorizationModel {
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
    loss: f32,
}

impl FactorizationModel {
    /// Number of latent dimensions.
    pub fn latent_dim(&self) -> usize {
        self.user_factors.ncols()
    }

    /// Sum of squared errors over the observed cells at the final
    /// training step. Diagnostic only.
    pub fn loss(&self) -> f32 {
        self.loss
    }

    /// Item ids in matrix column order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Raw affinity scores for `user_id` against every item, in matrix
    /// column order.
    pub fn raw_scores(&self, user_id: UserId) -> Result<Vec<f32>, PredictionError> {
        let row = *self.user_index
            .get(&user_id)
            .ok_or(PredictionError::UnknownUser)?;
        let user_factors = self.user_factors.row(row);

        let scores: Vec<f32> = self.item_factors
            .rows()
            .into_iter()
            .map(|item_factors| user_factors.dot(&item_factors))
            .collect();

        if scores.iter().all(|x| x.is_finite()) {
            Ok(scores)
        } else {
            Err(PredictionError::InvalidPredictionValue)
        }
    }
}

impl RankingModel for FactorizationModel {
    fn predict(&self, user_id: UserId, item_ids: &[ItemId]) -> Result<Vec<f32>, PredictionError> {
        let scores = self.raw_scores(user_id)?;

        item_ids
            .iter()
            .map(|item_id| {
                self.item_index
                    .get(item_id)
                    .map(|&column| scores[column])
                    .ok_or(PredictionError::UnknownItem)
            })
            .collect()
    }
}
