//! Hand template data: tensor containers, the on-disk bundle format and where
//! a bundle comes from.

pub mod source;
pub mod template;
