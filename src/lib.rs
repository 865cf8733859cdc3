//! # Prototypical Episodic Loss
//!
//! This library computes the loss and accuracy of one episode of few-shot
//! classification under the prototypical-network formulation.
//!
//! ## Overview
//!
//! Given a batch of embedded samples and their class labels, each class's
//! first `n_support` samples (in batch order) are averaged into a prototype
//! (centroid). Every remaining sample is a query, scored by the log-softmax
//! of its negated squared Euclidean distances to all prototypes. The loss is
//! the mean negative log-probability of each query's true class; the
//! accuracy is the fraction of queries whose nearest prototype is their own
//! class's.
//!
//! The crate is a pure numeric core: it performs no I/O and keeps no state
//! between calls. Producing the embeddings, sampling episodes, and driving
//! training belong to the caller.
//!
//! ## Modules
//!
//! - `loss` - Episodic scorer: partitioning, prototypes, loss and accuracy
//! - `distance` - Pairwise squared-Euclidean distances and log-softmax
//! - `error` - Error taxonomy for malformed episodes

pub mod distance;
pub mod error;
pub mod loss;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::distance::{log_softmax_rows, squared_euclidean};
    pub use crate::error::LossError;
    pub use crate::loss::{prototypical_loss, EpisodeScore, PrototypicalLoss};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
