//! Structured pose: one rotation vector per bone plus a global similarity transform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pose parameters consumed by [`crate::model::Model::get_skinned_vertex_positions`].
///
/// Bone rotations are axis-angle vectors expressed in each bone's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseParameters {
    pub global_rotation: [f64; 3],
    pub global_translation: [f64; 3],
    pub scale: [f64; 3],
    bones: BTreeMap<String, [f64; 3]>,
}

impl Default for PoseParameters {
    fn default() -> Self {
        Self {
            global_rotation: [0.0; 3],
            global_translation: [0.0; 3],
            scale: [1.0; 3],
            bones: BTreeMap::new(),
        }
    }
}

impl PoseParameters {
    /// Identity pose with every named bone at a zero rotation.
    pub fn zeroed<'a>(bone_names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            bones: bone_names
                .into_iter()
                .map(|name| (name.to_string(), [0.0; 3]))
                .collect(),
            ..Self::default()
        }
    }

    pub fn bone(&self, name: &str) -> Option<&[f64; 3]> {
        self.bones.get(name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut [f64; 3]> {
        self.bones.get_mut(name)
    }

    /// Set a bone rotation, returning the previous value if the bone was present.
    pub fn set_bone(&mut self, name: impl Into<String>, rotation: [f64; 3]) -> Option<[f64; 3]> {
        self.bones.insert(name.into(), rotation)
    }

    pub fn bones(&self) -> impl Iterator<Item = (&str, &[f64; 3])> {
        self.bones.iter().map(|(name, rv)| (name.as_str(), rv))
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_pose_has_unit_scale() {
        let pose = PoseParameters::zeroed(["root", "thumb2"]);
        assert_eq!(pose.scale, [1.0; 3]);
        assert_eq!(pose.bone("thumb2"), Some(&[0.0; 3]));
        assert_eq!(pose.bone_count(), 2);
        assert!(pose.bone("pinky9").is_none());
    }

    #[test]
    fn pose_serializes_to_json() {
        let mut pose = PoseParameters::zeroed(["index2"]);
        pose.set_bone("index2", [0.5, -0.25, 0.0]);
        let json = serde_json::to_string(&pose).unwrap();
        let back: PoseParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }
}
