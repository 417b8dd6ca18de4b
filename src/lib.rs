//! chira_hand: linear blend skinned hand model and a data-fitting energy.
//!
//! A 26-entry parameter vector (theta) is mapped onto per-bone rotation
//! vectors, the hand template is skinned with that pose, and the energy is the
//! sum of squared distances between observed points and the mesh vertices they
//! correspond to.
//!
//! ```
//! use chira_hand::{EnergyEvaluator, HandModel, Model, N_THETA, procedural};
//!
//! let model = HandModel::from_template(procedural::hand_template())?;
//! let theta = [0.0; N_THETA];
//! let pose = chira_hand::ParameterMapper::for_model(&model)?.map(&theta)?;
//! let skinned = model.get_skinned_vertex_positions(&pose)?;
//!
//! let indices = vec![0, 42, 99];
//! let points = indices.iter().map(|&i| skinned[i]).collect();
//! let energy = EnergyEvaluator::from_parts(&model, points, indices)?;
//! assert!(energy.evaluate(&theta)? < 1e-12);
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod data;
pub mod energy;
pub mod error;
pub mod model;
pub mod util;

pub use data::source::TemplateSource;
pub use energy::{
    Correspondences, EnergyEvaluator, N_THETA, ParameterMapper, THETA_LAYOUT, theta_labels,
};
pub use error::{HandError, HandResult};
pub use model::{HandModel, Model, PoseParameters, load_model, procedural};
