//! Data-fitting energy for the hand model: theta mapping and evaluation.

pub mod evaluator;
pub mod theta;

pub use evaluator::{Correspondences, EnergyEvaluator};
pub use theta::{N_THETA, ParameterMapper, THETA_LAYOUT, theta_labels};
