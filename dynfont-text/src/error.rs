use thiserror::Error;

use crate::atlas::AtlasError;
use crate::config::ConfigError;
use crate::fonts::FontError;

/// Any error surfaced by `dynfont-text`.
///
/// Construction fails with `Font` or `Config`; drawing can only fail
/// with `Atlas` (a glyph larger than the whole atlas).
#[derive(Error, Debug)]
pub enum TextError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
}
