//! Hand model pipeline (pose -> kinematics -> skinning) and the `Model`
//! capability the energy is evaluated against.

pub mod hand;
pub mod kinematics;
pub mod pose;
pub mod procedural;
pub mod skinning;

use std::sync::Arc;

use anyhow::Result;

pub use hand::{HandModel, load_model};
pub use pose::PoseParameters;

/// A skinned mesh that can be posed by named bone rotations.
pub trait Model {
    /// Bone names known to the model.
    fn names(&self) -> &[String];

    fn n_vertices(&self) -> usize;

    /// Posed vertex positions for `pose`, one per mesh vertex.
    fn get_skinned_vertex_positions(&self, pose: &PoseParameters) -> Result<Vec<[f64; 3]>>;

    /// Whether `pose` only moves the degrees of freedom the model exposes.
    fn pose_in_theta_space(&self, pose: &PoseParameters) -> bool;
}

impl<M: Model + ?Sized> Model for &M {
    fn names(&self) -> &[String] {
        (**self).names()
    }

    fn n_vertices(&self) -> usize {
        (**self).n_vertices()
    }

    fn get_skinned_vertex_positions(&self, pose: &PoseParameters) -> Result<Vec<[f64; 3]>> {
        (**self).get_skinned_vertex_positions(pose)
    }

    fn pose_in_theta_space(&self, pose: &PoseParameters) -> bool {
        (**self).pose_in_theta_space(pose)
    }
}

impl<M: Model + ?Sized> Model for Arc<M> {
    fn names(&self) -> &[String] {
        (**self).names()
    }

    fn n_vertices(&self) -> usize {
        (**self).n_vertices()
    }

    fn get_skinned_vertex_positions(&self, pose: &PoseParameters) -> Result<Vec<[f64; 3]>> {
        (**self).get_skinned_vertex_positions(pose)
    }

    fn pose_in_theta_space(&self, pose: &PoseParameters) -> bool {
        (**self).pose_in_theta_space(pose)
    }
}
