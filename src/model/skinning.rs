//! Linear blend skinning helpers.

use anyhow::{Result, bail};

use crate::data::template::TensorData;
use crate::util::math::transform_point;

/// Check that skinning bindings agree with a mesh of `vertices` vertices and a
/// skeleton of `bones` bones.
///
/// - `vertex_indices`: shape [V, K]
/// - `vertex_weights`: shape [V, K]
pub fn validate_bindings(
    vertices: usize,
    bones: usize,
    vertex_indices: &TensorData<i64>,
    vertex_weights: &TensorData<f64>,
) -> Result<()> {
    vertex_indices.check_len()?;
    vertex_weights.check_len()?;
    if vertex_indices.shape != vertex_weights.shape {
        bail!(
            "vertex index/weight shapes must match ({:?} vs {:?})",
            vertex_indices.shape,
            vertex_weights.shape
        );
    }
    if vertex_indices.shape.len() != 2 || vertex_indices.shape[0] != vertices {
        bail!(
            "vertex bindings must be [{vertices},K], got {:?}",
            vertex_indices.shape
        );
    }
    if let Some(bad) = vertex_indices
        .data
        .iter()
        .find(|&&b| b < 0 || b as usize >= bones)
    {
        bail!("bone index out of range: {bad} (skeleton has {bones} bones)");
    }
    Ok(())
}

/// Apply linear blend skinning to rest vertices.
///
/// - `rest_vertices`: V positions
/// - `bone_transforms`: J transforms `posed * inv(rest)`
/// - `vertex_indices` / `vertex_weights`: shape [V, K]
pub fn linear_blend_skinning(
    rest_vertices: &[[f64; 3]],
    bone_transforms: &[[f64; 16]],
    vertex_indices: &TensorData<i64>,
    vertex_weights: &TensorData<f64>,
) -> Result<Vec<[f64; 3]>> {
    validate_bindings(
        rest_vertices.len(),
        bone_transforms.len(),
        vertex_indices,
        vertex_weights,
    )?;
    let k = vertex_indices.shape[1];

    let mut out = Vec::with_capacity(rest_vertices.len());
    for (v, pos) in rest_vertices.iter().enumerate() {
        let mut accum = [0.0f64; 3];
        for ki in 0..k {
            let weight = vertex_weights.data[v * k + ki];
            if weight == 0.0 {
                continue;
            }
            let bone = vertex_indices.data[v * k + ki] as usize;
            let moved = transform_point(&bone_transforms[bone], *pos);
            accum[0] += weight * moved[0];
            accum[1] += weight * moved[1];
            accum[2] += weight * moved[2];
        }
        out.push(accum);
    }
    Ok(out)
}
