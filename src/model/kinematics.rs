//! Forward kinematics over the hand skeleton tree.

use anyhow::{Result, bail};

use crate::data::template::TensorData;
use crate::util::math::{invert_rigid_mat4, mat4_mul, rigid_mat4, rotvec_to_rotmat};

/// Bone hierarchy with precomputed rest transforms.
///
/// Rest poses are rigid world transforms (row-major 4x4). Bones are stored in
/// topological order: a parent always precedes its children.
#[derive(Debug, Clone)]
pub struct Skeleton {
    parents: Vec<Option<usize>>,
    rest_poses: Vec<[f64; 16]>,
    rest_inverses: Vec<[f64; 16]>,
    /// Rest transform relative to the parent bone (world rest for roots).
    local_rest: Vec<[f64; 16]>,
}

impl Skeleton {
    /// Build a skeleton from parent indices (`-1` for roots) and `[J,4,4]` rest poses.
    pub fn new(bone_parents: &[i64], rest_bone_poses: &TensorData<f64>) -> Result<Self> {
        let bones = bone_parents.len();
        if rest_bone_poses.shape != [bones, 4, 4] {
            bail!(
                "rest_bone_poses must be [{bones},4,4], got {:?}",
                rest_bone_poses.shape
            );
        }

        let mut parents = Vec::with_capacity(bones);
        for (j, &p) in bone_parents.iter().enumerate() {
            if p < 0 {
                parents.push(None);
            } else if (p as usize) < j {
                parents.push(Some(p as usize));
            } else {
                bail!("bone {j} has parent {p}; parents must precede their children");
            }
        }

        let rest_poses = (0..bones)
            .map(|j| slice_mat4(rest_bone_poses, j))
            .collect::<Result<Vec<_>>>()?;
        let rest_inverses: Vec<_> = rest_poses.iter().map(invert_rigid_mat4).collect();
        let local_rest = parents
            .iter()
            .zip(&rest_poses)
            .map(|(parent, rest)| match parent {
                Some(p) => mat4_mul(&rest_inverses[*p], rest),
                None => *rest,
            })
            .collect();

        Ok(Self {
            parents,
            rest_poses,
            rest_inverses,
            local_rest,
        })
    }

    pub fn bone_count(&self) -> usize {
        self.parents.len()
    }

    pub fn parent(&self, bone: usize) -> Option<usize> {
        self.parents.get(bone).copied().flatten()
    }

    pub fn rest_pose(&self, bone: usize) -> Option<&[f64; 16]> {
        self.rest_poses.get(bone)
    }

    /// Posed world transform per bone for the given local rotation vectors.
    pub fn posed_bone_transforms(&self, rotations: &[[f64; 3]]) -> Result<Vec<[f64; 16]>> {
        if rotations.len() != self.bone_count() {
            bail!(
                "expected {} bone rotations, got {}",
                self.bone_count(),
                rotations.len()
            );
        }
        let mut posed: Vec<[f64; 16]> = Vec::with_capacity(self.bone_count());
        for (j, rv) in rotations.iter().enumerate() {
            let local = mat4_mul(
                &self.local_rest[j],
                &rigid_mat4(&rotvec_to_rotmat(*rv), [0.0; 3]),
            );
            let world = match self.parents[j] {
                Some(p) => mat4_mul(&posed[p], &local),
                None => local,
            };
            posed.push(world);
        }
        Ok(posed)
    }

    /// Per-bone skinning transforms `posed * inv(rest)`.
    pub fn skinning_transforms(&self, rotations: &[[f64; 3]]) -> Result<Vec<[f64; 16]>> {
        let posed = self.posed_bone_transforms(rotations)?;
        Ok(posed
            .iter()
            .zip(&self.rest_inverses)
            .map(|(pose, rest_inv)| mat4_mul(pose, rest_inv))
            .collect())
    }
}

fn slice_mat4(t: &TensorData<f64>, j: usize) -> Result<[f64; 16]> {
    let idx = j * 16;
    let slice = t
        .data
        .get(idx..idx + 16)
        .ok_or_else(|| anyhow::anyhow!("mat4 slice OOB"))?;
    let mut out = [0.0; 16];
    out.copy_from_slice(slice);
    Ok(out)
}
