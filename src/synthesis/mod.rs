//! Brand Kit synthesis: keyword themes, the text-generation collaborator
//! seam, and final kit assembly.

pub mod brand_kit;
pub mod keywords;
pub mod textgen;

pub use brand_kit::build_brand_kit;
pub use textgen::{HttpTextGenerator, NullTextGenerator, TextGenerator};
