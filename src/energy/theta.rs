//! Theta layout and the theta -> pose parameter mapping.
//!
//! Theta is laid out as:
//! - `[0..3]`  global rotation (axis-angle)
//! - `[3..6]`  global translation
//! - `[6..26]` finger joints, in [`THETA_LAYOUT`] order
//!
//! Each finger contributes four values: flex + abduction at the knuckle
//! (joint 2) and flex only at joints 3 and 4.

use crate::error::{HandError, HandResult};
use crate::model::{Model, PoseParameters};

pub const FINGERS: [&str; 5] = ["thumb", "index", "middle", "ring", "pinky"];

/// Global rotation (3) + global translation (3).
pub const N_GLOBAL: usize = 6;
pub const DOF_PER_FINGER: usize = 4;
pub const N_THETA: usize = N_GLOBAL + FINGERS.len() * DOF_PER_FINGER;

/// A rotation-vector component of a finger joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Curl toward the palm, about the bone's local x axis.
    Flex,
    /// Side-to-side spread, about the bone's local y axis.
    Abduct,
}

impl Component {
    pub const fn index(self) -> usize {
        match self {
            Self::Flex => 0,
            Self::Abduct => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Flex => "flex",
            Self::Abduct => "abduct",
        }
    }
}

/// One finger joint and the theta components it consumes, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointDof {
    pub finger: &'static str,
    pub joint: u8,
    pub components: &'static [Component],
}

impl JointDof {
    const fn knuckle(finger: &'static str) -> Self {
        Self {
            finger,
            joint: 2,
            components: &[Component::Flex, Component::Abduct],
        }
    }

    const fn hinge(finger: &'static str, joint: u8) -> Self {
        Self {
            finger,
            joint,
            components: &[Component::Flex],
        }
    }

    /// Bone driven by this joint, e.g. `thumb2`.
    pub fn bone_name(&self) -> String {
        format!("{}{}", self.finger, self.joint)
    }

    /// Mask of rotation-vector components this joint drives.
    pub fn free_components(&self) -> [bool; 3] {
        let mut free = [false; 3];
        for c in self.components {
            free[c.index()] = true;
        }
        free
    }
}

/// Finger joints driven by theta, in consumption order.
pub const THETA_LAYOUT: [JointDof; 15] = [
    JointDof::knuckle("thumb"),
    JointDof::hinge("thumb", 3),
    JointDof::hinge("thumb", 4),
    JointDof::knuckle("index"),
    JointDof::hinge("index", 3),
    JointDof::hinge("index", 4),
    JointDof::knuckle("middle"),
    JointDof::hinge("middle", 3),
    JointDof::hinge("middle", 4),
    JointDof::knuckle("ring"),
    JointDof::hinge("ring", 3),
    JointDof::hinge("ring", 4),
    JointDof::knuckle("pinky"),
    JointDof::hinge("pinky", 3),
    JointDof::hinge("pinky", 4),
];

const fn consumed(layout: &[JointDof]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < layout.len() {
        total += layout[i].components.len();
        i += 1;
    }
    total
}

const _: () = assert!(N_GLOBAL + consumed(&THETA_LAYOUT) == N_THETA);

/// Human-readable name of every theta entry, in order.
pub fn theta_labels() -> Vec<String> {
    let mut labels: Vec<String> = ["global_rotation", "global_translation"]
        .iter()
        .flat_map(|name| ["x", "y", "z"].map(|axis| format!("{name}.{axis}")))
        .collect();
    for dof in &THETA_LAYOUT {
        for c in dof.components {
            labels.push(format!("{}.{}", dof.bone_name(), c.label()));
        }
    }
    labels
}

/// Maps theta onto the bones of a specific model.
#[derive(Debug, Clone)]
pub struct ParameterMapper {
    bone_names: Vec<String>,
}

impl ParameterMapper {
    /// Fails if a bone driven by [`THETA_LAYOUT`] is not among `bone_names`.
    pub fn new<S: AsRef<str>>(bone_names: &[S]) -> HandResult<Self> {
        let bone_names: Vec<String> = bone_names.iter().map(|s| s.as_ref().to_string()).collect();
        if let Some(missing) = THETA_LAYOUT
            .iter()
            .map(JointDof::bone_name)
            .find(|name| !bone_names.contains(name))
        {
            return Err(HandError::InvalidArgument(format!(
                "bone `{missing}` driven by theta is missing from the model"
            )));
        }
        Ok(Self { bone_names })
    }

    pub fn for_model(model: &impl Model) -> HandResult<Self> {
        Self::new(model.names())
    }

    pub fn n_theta(&self) -> usize {
        N_THETA
    }

    /// Convert theta into pose parameters. Bones not driven by theta stay at zero.
    pub fn map(&self, theta: &[f64]) -> HandResult<PoseParameters> {
        if theta.len() != N_THETA {
            return Err(HandError::InvalidArgument(format!(
                "theta must have {N_THETA} entries, got {}",
                theta.len()
            )));
        }

        let mut pose = PoseParameters::zeroed(self.bone_names.iter().map(String::as_str));
        pose.global_rotation = [theta[0], theta[1], theta[2]];
        pose.global_translation = [theta[3], theta[4], theta[5]];

        let mut i_theta = N_GLOBAL;
        for dof in &THETA_LAYOUT {
            let name = dof.bone_name();
            let rotation = pose.bone_mut(&name).ok_or_else(|| {
                HandError::InvalidArgument(format!("bone `{name}` missing from pose"))
            })?;
            for c in dof.components {
                rotation[c.index()] = theta[i_theta];
                i_theta += 1;
            }
        }
        debug_assert_eq!(i_theta, N_THETA);
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        let mut names = vec!["root".to_string()];
        for finger in FINGERS {
            names.extend((1..=4).map(|j| format!("{finger}{j}")));
        }
        names
    }

    fn ramp() -> Vec<f64> {
        (0..N_THETA).map(|i| i as f64 + 1.0).collect()
    }

    #[test]
    fn layout_consumes_twenty_finger_values() {
        assert_eq!(consumed(&THETA_LAYOUT), 20);
        assert_eq!(N_THETA, 26);
        assert_eq!(theta_labels().len(), N_THETA);
    }

    #[test]
    fn labels_follow_consumption_order() {
        let labels = theta_labels();
        assert_eq!(labels[0], "global_rotation.x");
        assert_eq!(labels[5], "global_translation.z");
        assert_eq!(labels[6], "thumb2.flex");
        assert_eq!(labels[7], "thumb2.abduct");
        assert_eq!(labels[8], "thumb3.flex");
        assert_eq!(labels[25], "pinky4.flex");
    }

    #[test]
    fn zero_theta_maps_to_identity_pose() {
        let mapper = ParameterMapper::new(&names()).unwrap();
        let pose = mapper.map(&[0.0; N_THETA]).unwrap();
        assert_eq!(pose.global_rotation, [0.0; 3]);
        assert_eq!(pose.global_translation, [0.0; 3]);
        assert_eq!(pose.scale, [1.0; 3]);
        assert_eq!(pose.bone_count(), names().len());
        assert!(pose.bones().all(|(_, rv)| *rv == [0.0; 3]));
    }

    #[test]
    fn values_land_in_declared_slots() {
        let mapper = ParameterMapper::new(&names()).unwrap();
        let pose = mapper.map(&ramp()).unwrap();
        assert_eq!(pose.global_rotation, [1.0, 2.0, 3.0]);
        assert_eq!(pose.global_translation, [4.0, 5.0, 6.0]);
        assert_eq!(pose.bone("thumb2"), Some(&[7.0, 8.0, 0.0]));
        assert_eq!(pose.bone("thumb3"), Some(&[9.0, 0.0, 0.0]));
        assert_eq!(pose.bone("thumb4"), Some(&[10.0, 0.0, 0.0]));
        assert_eq!(pose.bone("index2"), Some(&[11.0, 12.0, 0.0]));
        assert_eq!(pose.bone("pinky4"), Some(&[26.0, 0.0, 0.0]));
        assert_eq!(pose.bone("root"), Some(&[0.0; 3]));
        assert_eq!(pose.bone("middle1"), Some(&[0.0; 3]));
    }

    #[test]
    fn only_twenty_bone_components_are_set() {
        let mapper = ParameterMapper::new(&names()).unwrap();
        let pose = mapper.map(&ramp()).unwrap();
        let nonzero: usize = pose
            .bones()
            .map(|(_, rv)| rv.iter().filter(|x| **x != 0.0).count())
            .sum();
        assert_eq!(nonzero, 20);
    }

    #[test]
    fn mapping_is_deterministic() {
        let mapper = ParameterMapper::new(&names()).unwrap();
        let theta: Vec<f64> = (0..N_THETA).map(|i| (i as f64 * 0.37).sin()).collect();
        assert_eq!(mapper.map(&theta).unwrap(), mapper.map(&theta).unwrap());
    }

    #[test]
    fn wrong_theta_length_is_invalid() {
        let mapper = ParameterMapper::new(&names()).unwrap();
        for len in [0, 25, 27] {
            let err = mapper.map(&vec![0.0; len]).unwrap_err();
            assert!(matches!(err, HandError::InvalidArgument(_)), "len {len}: {err}");
        }
    }

    #[test]
    fn model_missing_a_driven_bone_is_rejected() {
        let names: Vec<String> = names().into_iter().filter(|n| n != "ring3").collect();
        let err = ParameterMapper::new(&names).unwrap_err();
        assert!(err.to_string().contains("ring3"));
    }
}
