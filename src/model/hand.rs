//! Linear blend skinned hand backed by a template bundle.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::data::template::{
    TemplateBundle, TemplateMeta, TensorData, load_template, load_template_from_bytes,
};
use crate::model::kinematics::Skeleton;
use crate::model::skinning::{linear_blend_skinning, validate_bindings};
use crate::model::{Model, PoseParameters};
use crate::util::math::{mat3_mul_vec3, rotvec_to_rotmat};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Hand mesh + skeleton, immutable after construction.
#[derive(Debug, Clone)]
pub struct HandModel {
    names: Vec<String>,
    bone_index: HashMap<String, usize>,
    bone_dofs: Vec<[bool; 3]>,
    skeleton: Skeleton,
    rest_vertices: Vec<[f64; 3]>,
    vertex_bone_indices: TensorData<i64>,
    vertex_bone_weights: TensorData<f64>,
}

/// Load a hand model from an exported template directory.
pub fn load_model(path: impl AsRef<Path>) -> Result<HandModel> {
    let path = path.as_ref();
    let bundle =
        load_template(path).with_context(|| format!("loading hand template {}", path.display()))?;
    HandModel::from_template(bundle)
}

impl HandModel {
    pub fn from_template(bundle: TemplateBundle) -> Result<Self> {
        let TemplateBundle {
            meta,
            rest_vertices,
            rest_bone_poses,
            vertex_bone_indices,
            vertex_bone_weights,
        } = bundle;
        let TemplateMeta {
            bone_names,
            bone_parents,
            bone_dofs,
        } = meta;

        for (name, result) in [
            ("rest_vertices", rest_vertices.check_len()),
            ("rest_bone_poses", rest_bone_poses.check_len()),
            ("vertex_bone_indices", vertex_bone_indices.check_len()),
            ("vertex_bone_weights", vertex_bone_weights.check_len()),
        ] {
            result.with_context(|| format!("template tensor `{name}`"))?;
        }

        let bones = bone_names.len();
        if bone_parents.len() != bones || bone_dofs.len() != bones {
            bail!(
                "template lists {bones} bone names, {} parents and {} dof masks",
                bone_parents.len(),
                bone_dofs.len()
            );
        }
        let mut bone_index = HashMap::with_capacity(bones);
        for (j, name) in bone_names.iter().enumerate() {
            if bone_index.insert(name.clone(), j).is_some() {
                bail!("duplicate bone name `{name}`");
            }
        }
        let skeleton = Skeleton::new(&bone_parents, &rest_bone_poses)?;

        if rest_vertices.shape.len() != 2 || rest_vertices.shape[1] != 3 {
            bail!("rest_vertices must be [V,3], got {:?}", rest_vertices.shape);
        }
        let rest_vertices: Vec<[f64; 3]> = rest_vertices
            .data
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        validate_bindings(
            rest_vertices.len(),
            bones,
            &vertex_bone_indices,
            &vertex_bone_weights,
        )?;

        let k = vertex_bone_weights.shape[1];
        let unnormalized = vertex_bone_weights
            .data
            .chunks_exact(k.max(1))
            .filter(|row| (row.iter().sum::<f64>() - 1.0).abs() > WEIGHT_SUM_TOLERANCE)
            .count();
        if unnormalized > 0 {
            tracing::warn!(unnormalized, "template has skinning weight rows not summing to 1");
        }

        tracing::debug!(
            bones,
            vertices = rest_vertices.len(),
            influences = k,
            "hand model ready"
        );
        Ok(Self {
            names: bone_names,
            bone_index,
            bone_dofs,
            skeleton,
            rest_vertices,
            vertex_bone_indices,
            vertex_bone_weights,
        })
    }

    /// Build a model from in-memory bundle bytes (e.g. `include_bytes!`).
    pub fn from_template_bytes(tensor_bytes: &[u8], meta_bytes: &[u8]) -> Result<Self> {
        Self::from_template(load_template_from_bytes(tensor_bytes, meta_bytes)?)
    }

    /// Export the model back into a template bundle.
    pub fn to_template(&self) -> TemplateBundle {
        let bones = self.names.len();
        let bone_parents = (0..bones)
            .map(|j| self.skeleton.parent(j).map_or(-1, |p| p as i64))
            .collect();
        let rest_bone_poses = (0..bones)
            .filter_map(|j| self.skeleton.rest_pose(j))
            .flat_map(|m| m.iter().copied())
            .collect();
        TemplateBundle {
            meta: TemplateMeta {
                bone_names: self.names.clone(),
                bone_parents,
                bone_dofs: self.bone_dofs.clone(),
            },
            rest_vertices: TensorData {
                shape: vec![self.rest_vertices.len(), 3],
                data: self.rest_vertices.iter().flatten().copied().collect(),
            },
            rest_bone_poses: TensorData {
                shape: vec![bones, 4, 4],
                data: rest_bone_poses,
            },
            vertex_bone_indices: self.vertex_bone_indices.clone(),
            vertex_bone_weights: self.vertex_bone_weights.clone(),
        }
    }

    pub fn rest_vertices(&self) -> &[[f64; 3]] {
        &self.rest_vertices
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_index.get(name).copied()
    }

    pub fn bone_dofs(&self, name: &str) -> Option<[bool; 3]> {
        self.bone_index(name).map(|j| self.bone_dofs[j])
    }

    /// Bones (by index) influencing vertex `v` with non-zero weight.
    pub fn vertex_influences(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        let k = self.vertex_bone_indices.shape[1];
        let range = if v < self.rest_vertices.len() {
            v * k..(v + 1) * k
        } else {
            0..0
        };
        self.vertex_bone_indices.data[range.clone()]
            .iter()
            .zip(&self.vertex_bone_weights.data[range])
            .filter(|(_, w)| **w != 0.0)
            .map(|(b, _)| *b as usize)
    }
}

impl Model for HandModel {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn n_vertices(&self) -> usize {
        self.rest_vertices.len()
    }

    fn get_skinned_vertex_positions(&self, pose: &PoseParameters) -> Result<Vec<[f64; 3]>> {
        let rotations = self
            .names
            .iter()
            .map(|name| {
                pose.bone(name)
                    .copied()
                    .with_context(|| format!("pose is missing bone `{name}`"))
            })
            .collect::<Result<Vec<_>>>()?;
        let transforms = self.skeleton.skinning_transforms(&rotations)?;
        let mut vertices = linear_blend_skinning(
            &self.rest_vertices,
            &transforms,
            &self.vertex_bone_indices,
            &self.vertex_bone_weights,
        )?;

        let global = rotvec_to_rotmat(pose.global_rotation);
        let [sx, sy, sz] = pose.scale;
        let [tx, ty, tz] = pose.global_translation;
        for v in &mut vertices {
            let r = mat3_mul_vec3(&global, [v[0] * sx, v[1] * sy, v[2] * sz]);
            *v = [r[0] + tx, r[1] + ty, r[2] + tz];
        }
        Ok(vertices)
    }

    fn pose_in_theta_space(&self, pose: &PoseParameters) -> bool {
        if pose.bone_count() != self.names.len() {
            return false;
        }
        let globals_ok = pose
            .global_rotation
            .iter()
            .chain(&pose.global_translation)
            .all(|x| x.is_finite())
            && pose.scale.iter().all(|s| s.is_finite() && *s > 0.0);
        if !globals_ok {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.names.len());
        pose.bones().all(|(name, rv)| {
            let Some(j) = self.bone_index(name) else {
                return false;
            };
            seen.insert(j);
            rv.iter()
                .zip(self.bone_dofs[j])
                .all(|(x, free)| x.is_finite() && (free || *x == 0.0))
        }) && seen.len() == self.names.len()
    }
}
