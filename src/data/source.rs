//! Where a hand template is read from.

use std::path::PathBuf;

use anyhow::Result;

use crate::data::template::{TemplateBundle, load_template, load_template_from_bytes};
use crate::model::procedural;

#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Directory produced by an exporter (`template.safetensors` + `template.meta.json`).
    Directory(PathBuf),
    /// Bundle bytes embedded in the binary (e.g. via `include_bytes!`).
    Embedded {
        tensors: &'static [u8],
        meta: &'static [u8],
    },
    /// The built-in procedural hand.
    Procedural,
}

impl TemplateSource {
    pub fn load(&self) -> Result<TemplateBundle> {
        match self {
            Self::Directory(dir) => load_template(dir),
            Self::Embedded { tensors, meta } => load_template_from_bytes(tensors, meta),
            Self::Procedural => Ok(procedural::hand_template()),
        }
    }
}

impl From<Option<PathBuf>> for TemplateSource {
    fn from(dir: Option<PathBuf>) -> Self {
        dir.map_or(Self::Procedural, Self::Directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::template::serialize_template;

    #[test]
    fn embedded_bytes_load_like_the_procedural_hand() {
        let bundle = procedural::hand_template();
        let (tensors, meta) = serialize_template(&bundle).unwrap();
        let source = TemplateSource::Embedded {
            tensors: Box::leak(tensors.into_boxed_slice()),
            meta: Box::leak(meta.into_boxed_slice()),
        };
        assert_eq!(source.load().unwrap(), bundle);
    }

    #[test]
    fn missing_directory_falls_back_to_procedural() {
        assert!(matches!(TemplateSource::from(None), TemplateSource::Procedural));
    }
}
