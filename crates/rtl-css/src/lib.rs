//! Concrete collaborators for `rtl-pipeline`: a span-splicing mirror engine
//! and a lightningcss-backed minifier.

pub mod minify;
pub mod mirror;
mod rename;
pub mod syntax;
mod values;

pub use minify::LightningMinifier;
pub use mirror::MirrorEngine;
