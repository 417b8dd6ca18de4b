//! Built-in procedural hand template.
//!
//! A coarse 21-bone hand: a `root` palm bone plus four bones per finger
//! (`thumb1`..`thumb4`, `index1`..`index4`, ...). Fingers extend along +y in
//! the palm plane (z = 0). Finger bone frames put the flex axis on local x
//! and the abduction axis on local y (the palm normal). Free rotation DOFs
//! follow [`THETA_LAYOUT`]. Used by tests, the demo driver and the template
//! exporter when no exported hand is at hand.

use crate::data::template::{TemplateBundle, TemplateMeta, TensorData};
use crate::energy::theta::{FINGERS, THETA_LAYOUT};
use crate::util::math::{IDENTITY_MAT4, rigid_mat4};

/// Bones per finger, metacarpal (1) to tip (4).
const FINGER_BONES: usize = 4;
/// Influences per vertex.
const INFLUENCES: usize = 2;
const RING_RADIUS: f64 = 0.008;
/// Fraction of a bone's first vertex ring bound to its parent.
const PARENT_BLEND: f64 = 0.3;

/// (x offset of the metacarpal head, bone lengths metacarpal..tip), in meters.
const FINGER_GEOMETRY: [(f64, [f64; FINGER_BONES]); 5] = [
    (-0.045, [0.030, 0.032, 0.028, 0.022]),
    (-0.022, [0.065, 0.040, 0.025, 0.020]),
    (0.000, [0.065, 0.044, 0.028, 0.021]),
    (0.020, [0.062, 0.041, 0.027, 0.020]),
    (0.038, [0.058, 0.032, 0.020, 0.018]),
];

/// Rotation taking bone-local axes (x flex, y abduct, z = -bone direction) to world.
const FINGER_FRAME: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0];

/// Build the procedural template.
pub fn hand_template() -> TemplateBundle {
    let mut builder = Builder::default();
    builder.push_bone("root", None, IDENTITY_MAT4);
    builder.push_palm();

    for (finger, (x0, lengths)) in FINGERS.iter().zip(FINGER_GEOMETRY) {
        let mut parent = 0;
        let mut head_y = 0.0;
        for (j, length) in lengths.iter().enumerate() {
            let name = format!("{finger}{}", j + 1);
            let head = [x0, head_y, 0.0];
            let bone = builder.push_bone(&name, Some(parent), rigid_mat4(&FINGER_FRAME, head));
            builder.push_segment(bone, parent, head, *length, j + 1 == FINGER_BONES);
            parent = bone;
            head_y += length;
        }
    }

    builder.finish()
}

#[derive(Default)]
struct Builder {
    names: Vec<String>,
    parents: Vec<i64>,
    dofs: Vec<[bool; 3]>,
    poses: Vec<f64>,
    vertices: Vec<f64>,
    indices: Vec<i64>,
    weights: Vec<f64>,
}

impl Builder {
    fn push_bone(&mut self, name: &str, parent: Option<usize>, rest: [f64; 16]) -> usize {
        let free = THETA_LAYOUT
            .iter()
            .find(|dof| dof.bone_name() == name)
            .map_or([false; 3], |dof| dof.free_components());
        self.names.push(name.to_string());
        self.parents.push(parent.map_or(-1, |p| p as i64));
        self.dofs.push(free);
        self.poses.extend_from_slice(&rest);
        self.names.len() - 1
    }

    fn push_vertex(&mut self, position: [f64; 3], bindings: [(usize, f64); INFLUENCES]) {
        self.vertices.extend_from_slice(&position);
        for (bone, weight) in bindings {
            self.indices.push(bone as i64);
            self.weights.push(weight);
        }
    }

    /// Palm grid in z = 0, bound to the root bone.
    fn push_palm(&mut self) {
        for row in 0..4 {
            for col in 0..3 {
                let x = -0.035 + 0.035 * f64::from(col);
                let y = 0.015 + 0.015 * f64::from(row);
                self.push_vertex([x, y, 0.0], [(0, 1.0), (0, 0.0)]);
            }
        }
    }

    /// Two rings of vertices around a bone; the proximal ring blends with the parent.
    fn push_segment(&mut self, bone: usize, parent: usize, head: [f64; 3], length: f64, tip: bool) {
        let offsets = [
            [RING_RADIUS, 0.0, 0.0],
            [-RING_RADIUS, 0.0, 0.0],
            [0.0, 0.0, RING_RADIUS],
            [0.0, 0.0, -RING_RADIUS],
        ];
        for (t, bindings) in [
            (0.25, [(bone, 1.0 - PARENT_BLEND), (parent, PARENT_BLEND)]),
            (0.75, [(bone, 1.0), (bone, 0.0)]),
        ] {
            for o in offsets {
                let position = [head[0] + o[0], head[1] + t * length + o[1], head[2] + o[2]];
                self.push_vertex(position, bindings);
            }
        }
        if tip {
            self.push_vertex([head[0], head[1] + length, head[2]], [(bone, 1.0), (bone, 0.0)]);
        }
    }

    fn finish(self) -> TemplateBundle {
        let bones = self.names.len();
        let vertices = self.vertices.len() / 3;
        TemplateBundle {
            meta: TemplateMeta {
                bone_names: self.names,
                bone_parents: self.parents,
                bone_dofs: self.dofs,
            },
            rest_vertices: TensorData {
                shape: vec![vertices, 3],
                data: self.vertices,
            },
            rest_bone_poses: TensorData {
                shape: vec![bones, 4, 4],
                data: self.poses,
            },
            vertex_bone_indices: TensorData {
                shape: vec![vertices, INFLUENCES],
                data: self.indices,
            },
            vertex_bone_weights: TensorData {
                shape: vec![vertices, INFLUENCES],
                data: self.weights,
            },
        }
    }
}
