//! Sum-of-squared-distances data term between observed points and skinned vertices.

use crate::energy::theta::ParameterMapper;
use crate::error::{HandError, HandResult};
use crate::model::{Model, PoseParameters};
use crate::util::math::{dot3, sub3};

/// Observed points paired with the mesh vertices they should lie on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondences {
    points: Vec<[f64; 3]>,
    vertex_indices: Vec<usize>,
}

impl Correspondences {
    pub fn new(points: Vec<[f64; 3]>, vertex_indices: Vec<usize>) -> HandResult<Self> {
        if points.len() != vertex_indices.len() {
            return Err(HandError::InvalidArgument(format!(
                "{} data points but {} correspondences",
                points.len(),
                vertex_indices.len()
            )));
        }
        Ok(Self {
            points,
            vertex_indices,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Observed points, editable in place. The set's length cannot change.
    pub fn points_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.points
    }

    pub fn vertex_indices(&self) -> &[usize] {
        &self.vertex_indices
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64; 3], usize)> {
        self.points.iter().zip(self.vertex_indices.iter().copied())
    }

    /// Split into `[0, mid)` and `[mid, len)`. `mid` is clamped to the length.
    pub fn split_at(&self, mid: usize) -> (Self, Self) {
        let mid = mid.min(self.len());
        let (p0, p1) = self.points.split_at(mid);
        let (i0, i1) = self.vertex_indices.split_at(mid);
        (
            Self {
                points: p0.to_vec(),
                vertex_indices: i0.to_vec(),
            },
            Self {
                points: p1.to_vec(),
                vertex_indices: i1.to_vec(),
            },
        )
    }
}

/// Energy of a hand pose against a fixed set of correspondences.
///
/// Holds no per-call state: `evaluate` takes `&self`, so one evaluator per
/// thread (or a shared one behind `&`) is fine as long as `M` allows it.
#[derive(Debug, Clone)]
pub struct EnergyEvaluator<M> {
    model: M,
    mapper: ParameterMapper,
    correspondences: Correspondences,
}

impl<M: Model> EnergyEvaluator<M> {
    pub fn new(model: M, correspondences: Correspondences) -> HandResult<Self> {
        let mapper = ParameterMapper::for_model(&model)?;
        Ok(Self {
            model,
            mapper,
            correspondences,
        })
    }

    /// Build from parallel point and vertex-index lists.
    pub fn from_parts(
        model: M,
        points: Vec<[f64; 3]>,
        vertex_indices: Vec<usize>,
    ) -> HandResult<Self> {
        Self::new(model, Correspondences::new(points, vertex_indices)?)
    }

    pub fn n_theta(&self) -> usize {
        self.mapper.n_theta()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn correspondences(&self) -> &Correspondences {
        &self.correspondences
    }

    pub fn points_mut(&mut self) -> &mut [[f64; 3]] {
        self.correspondences.points_mut()
    }

    pub fn to_pose_params(&self, theta: &[f64]) -> HandResult<PoseParameters> {
        self.mapper.map(theta)
    }

    /// Skinned vertex positions for `theta`.
    pub fn skinned_vertices(&self, theta: &[f64]) -> HandResult<Vec<[f64; 3]>> {
        let pose = self.mapper.map(theta)?;
        Ok(self.model.get_skinned_vertex_positions(&pose)?)
    }

    /// Per-correspondence `observed - skinned` vectors.
    pub fn residuals(&self, theta: &[f64]) -> HandResult<Vec<[f64; 3]>> {
        let vertices = self.skinned_vertices(theta)?;
        self.correspondences
            .iter()
            .map(|(point, index)| {
                vertices
                    .get(index)
                    .map(|vertex| sub3(*point, *vertex))
                    .ok_or(HandError::IndexOutOfRange {
                        index,
                        vertex_count: vertices.len(),
                    })
            })
            .collect()
    }

    /// Sum of squared distances between each data point and its vertex.
    pub fn evaluate(&self, theta: &[f64]) -> HandResult<f64> {
        let energy: f64 = self
            .residuals(theta)?
            .into_iter()
            .map(|r| dot3(r, r))
            .sum();
        tracing::debug!(energy, points = self.correspondences.len(), "evaluated energy");
        Ok(energy)
    }
}
