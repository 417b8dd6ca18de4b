//! On-disk hand template bundle: safetensors tensors plus JSON metadata.
//!
//! A template directory holds two files:
//! - `template.safetensors`: `rest_vertices` [V,3], `rest_bone_poses` [J,4,4],
//!   `vertex_bone_indices` [V,K] (i64) and `vertex_bone_weights` [V,K]
//! - `template.meta.json`: bone names, parent indices and free rotation DOFs
//!
//! Float tensors may be stored as f32 or f64; they are widened to f64 on load.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use serde::{Deserialize, Serialize};

pub const TENSOR_FILE: &str = "template.safetensors";
pub const META_FILE: &str = "template.meta.json";

/// Dense row-major tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> TensorData<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let tensor = Self { shape, data };
        tensor.check_len()?;
        Ok(tensor)
    }

    /// Fails unless `data` holds exactly the elements `shape` describes.
    pub fn check_len(&self) -> Result<()> {
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            bail!(
                "tensor shape {:?} needs {expected} elements, got {}",
                self.shape,
                self.data.len()
            );
        }
        Ok(())
    }
}

/// Skeleton description stored next to the tensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub bone_names: Vec<String>,
    /// Parent index per bone, `-1` for roots.
    pub bone_parents: Vec<i64>,
    /// Rotation-vector components of each bone that theta may drive.
    pub bone_dofs: Vec<[bool; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBundle {
    pub meta: TemplateMeta,
    pub rest_vertices: TensorData<f64>,
    pub rest_bone_poses: TensorData<f64>,
    pub vertex_bone_indices: TensorData<i64>,
    pub vertex_bone_weights: TensorData<f64>,
}

/// Load a template bundle from a directory containing [`TENSOR_FILE`] and [`META_FILE`].
pub fn load_template(dir: impl AsRef<Path>) -> Result<TemplateBundle> {
    let dir = dir.as_ref();
    load_template_from_paths(dir.join(TENSOR_FILE), dir.join(META_FILE))
}

pub fn load_template_from_paths(
    tensor_path: impl AsRef<Path>,
    meta_path: impl AsRef<Path>,
) -> Result<TemplateBundle> {
    let tensor_path = tensor_path.as_ref();
    let meta_path = meta_path.as_ref();
    let tensor_bytes =
        fs::read(tensor_path).with_context(|| format!("reading {}", tensor_path.display()))?;
    let meta_bytes =
        fs::read(meta_path).with_context(|| format!("reading {}", meta_path.display()))?;
    tracing::debug!(
        tensors = %tensor_path.display(),
        meta = %meta_path.display(),
        "loading hand template"
    );
    load_template_from_bytes(&tensor_bytes, &meta_bytes)
}

/// Load a template bundle from in-memory bytes.
pub fn load_template_from_bytes(tensor_bytes: &[u8], meta_bytes: &[u8]) -> Result<TemplateBundle> {
    let meta: TemplateMeta =
        serde_json::from_slice(meta_bytes).context("parsing template metadata")?;
    let tensors = SafeTensors::deserialize(tensor_bytes).context("parsing template tensors")?;

    let rest_vertices = read_f64(&tensors, "rest_vertices")?;
    let rest_bone_poses = read_f64(&tensors, "rest_bone_poses")?;
    let vertex_bone_indices = read_i64(&tensors, "vertex_bone_indices")?;
    let vertex_bone_weights = read_f64(&tensors, "vertex_bone_weights")?;

    if rest_vertices.shape.len() != 2 || rest_vertices.shape[1] != 3 {
        bail!("rest_vertices must be [V,3], got {:?}", rest_vertices.shape);
    }
    if rest_bone_poses.shape.len() != 3 || rest_bone_poses.shape[1..] != [4, 4] {
        bail!("rest_bone_poses must be [J,4,4], got {:?}", rest_bone_poses.shape);
    }
    if vertex_bone_indices.shape.len() != 2 {
        bail!(
            "vertex_bone_indices must be [V,K], got {:?}",
            vertex_bone_indices.shape
        );
    }

    Ok(TemplateBundle {
        meta,
        rest_vertices,
        rest_bone_poses,
        vertex_bone_indices,
        vertex_bone_weights,
    })
}

/// Write a bundle into `dir` (created if missing) as f64/i64 tensors.
pub fn write_template(bundle: &TemplateBundle, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let (tensor_bytes, meta_bytes) = serialize_template(bundle)?;
    fs::write(dir.join(TENSOR_FILE), tensor_bytes)
        .with_context(|| format!("writing {}", dir.join(TENSOR_FILE).display()))?;
    fs::write(dir.join(META_FILE), meta_bytes)
        .with_context(|| format!("writing {}", dir.join(META_FILE).display()))?;
    Ok(())
}

/// Encode a bundle as `(safetensors bytes, metadata json bytes)`.
pub fn serialize_template(bundle: &TemplateBundle) -> Result<(Vec<u8>, Vec<u8>)> {
    let vertices = f64_le_bytes(&bundle.rest_vertices.data);
    let poses = f64_le_bytes(&bundle.rest_bone_poses.data);
    let indices: Vec<u8> = bundle
        .vertex_bone_indices
        .data
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let weights = f64_le_bytes(&bundle.vertex_bone_weights.data);

    let views = vec![
        (
            "rest_vertices",
            TensorView::new(Dtype::F64, bundle.rest_vertices.shape.clone(), &vertices)?,
        ),
        (
            "rest_bone_poses",
            TensorView::new(Dtype::F64, bundle.rest_bone_poses.shape.clone(), &poses)?,
        ),
        (
            "vertex_bone_indices",
            TensorView::new(
                Dtype::I64,
                bundle.vertex_bone_indices.shape.clone(),
                &indices,
            )?,
        ),
        (
            "vertex_bone_weights",
            TensorView::new(
                Dtype::F64,
                bundle.vertex_bone_weights.shape.clone(),
                &weights,
            )?,
        ),
    ];
    let info: Option<HashMap<String, String>> = None;
    let tensor_bytes = safetensors::serialize(views, &info).context("encoding template tensors")?;
    let meta_bytes = serde_json::to_vec_pretty(&bundle.meta).context("encoding template metadata")?;
    Ok((tensor_bytes, meta_bytes))
}

fn f64_le_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn read_f64(tensors: &SafeTensors<'_>, name: &str) -> Result<TensorData<f64>> {
    let view = tensors
        .tensor(name)
        .with_context(|| format!("template tensor `{name}` missing"))?;
    let data = match view.dtype() {
        Dtype::F64 => view
            .data()
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_le_bytes(b)
            })
            .collect(),
        Dtype::F32 => view
            .data()
            .chunks_exact(4)
            .map(|c| {
                let mut b = [0u8; 4];
                b.copy_from_slice(c);
                f64::from(f32::from_le_bytes(b))
            })
            .collect(),
        other => bail!("template tensor `{name}` has unsupported dtype {other:?}"),
    };
    TensorData::new(view.shape().to_vec(), data)
}

fn read_i64(tensors: &SafeTensors<'_>, name: &str) -> Result<TensorData<i64>> {
    let view = tensors
        .tensor(name)
        .with_context(|| format!("template tensor `{name}` missing"))?;
    let data = match view.dtype() {
        Dtype::I64 => view
            .data()
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                i64::from_le_bytes(b)
            })
            .collect(),
        Dtype::I32 => view
            .data()
            .chunks_exact(4)
            .map(|c| {
                let mut b = [0u8; 4];
                b.copy_from_slice(c);
                i64::from(i32::from_le_bytes(b))
            })
            .collect(),
        other => bail!("template tensor `{name}` has unsupported dtype {other:?}"),
    };
    TensorData::new(view.shape().to_vec(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_bundle() -> TemplateBundle {
        TemplateBundle {
            meta: TemplateMeta {
                bone_names: vec!["root".into()],
                bone_parents: vec![-1],
                bone_dofs: vec![[false; 3]],
            },
            rest_vertices: TensorData {
                shape: vec![2, 3],
                data: vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0],
            },
            rest_bone_poses: TensorData {
                shape: vec![1, 4, 4],
                data: crate::util::math::IDENTITY_MAT4.to_vec(),
            },
            vertex_bone_indices: TensorData {
                shape: vec![2, 1],
                data: vec![0, 0],
            },
            vertex_bone_weights: TensorData {
                shape: vec![2, 1],
                data: vec![1.0, 1.0],
            },
        }
    }

    #[test]
    fn bytes_round_trip() {
        let bundle = tiny_bundle();
        let (tensors, meta) = serialize_template(&bundle).unwrap();
        let loaded = load_template_from_bytes(&tensors, &meta).unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = tiny_bundle();
        write_template(&bundle, dir.path()).unwrap();
        assert!(dir.path().join(TENSOR_FILE).is_file());
        let loaded = load_template(dir.path()).unwrap();
        assert_eq!(loaded.meta, bundle.meta);
        assert_eq!(loaded.rest_vertices, bundle.rest_vertices);
    }

    #[test]
    fn missing_directory_reports_path() {
        let err = load_template("/definitely/not/a/template").unwrap_err();
        assert!(format!("{err:#}").contains(TENSOR_FILE));
    }

    #[test]
    fn narrow_dtypes_are_widened() {
        let vertices: Vec<u8> = [0.5f32, -1.25, 2.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let poses: Vec<u8> = crate::util::math::IDENTITY_MAT4
            .iter()
            .flat_map(|v| (*v as f32).to_le_bytes())
            .collect();
        let indices: Vec<u8> = 0i32.to_le_bytes().to_vec();
        let weights: Vec<u8> = 1.0f32.to_le_bytes().to_vec();
        let views = vec![
            (
                "rest_vertices",
                TensorView::new(Dtype::F32, vec![1, 3], &vertices).unwrap(),
            ),
            (
                "rest_bone_poses",
                TensorView::new(Dtype::F32, vec![1, 4, 4], &poses).unwrap(),
            ),
            (
                "vertex_bone_indices",
                TensorView::new(Dtype::I32, vec![1, 1], &indices).unwrap(),
            ),
            (
                "vertex_bone_weights",
                TensorView::new(Dtype::F32, vec![1, 1], &weights).unwrap(),
            ),
        ];
        let info: Option<HashMap<String, String>> = None;
        let tensors = safetensors::serialize(views, &info).unwrap();
        let meta = serde_json::to_vec(&tiny_bundle().meta).unwrap();

        let loaded = load_template_from_bytes(&tensors, &meta).unwrap();
        assert_eq!(loaded.rest_vertices.data, vec![0.5, -1.25, 2.0]);
        assert_eq!(loaded.rest_bone_poses.data, crate::util::math::IDENTITY_MAT4.to_vec());
        assert_eq!(loaded.vertex_bone_indices.data, vec![0i64]);
        assert_eq!(loaded.vertex_bone_weights.data, vec![1.0]);
    }

    #[test]
    fn check_len_catches_hand_built_tensors() {
        let tensor = TensorData {
            shape: vec![3, 2],
            data: vec![0i64; 4],
        };
        assert!(tensor.check_len().is_err());
    }

    #[test]
    fn tensor_shape_must_match_len() {
        assert!(TensorData::new(vec![2, 3], vec![0.0; 5]).is_err());
    }
}
