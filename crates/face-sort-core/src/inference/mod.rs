//! Candle inference for the bundled face analyzer.
//!
//! Two networks run per image: the `BlazeFace` detector and a small gender
//! classifier applied to the strongest detected face.

mod analyzer;
mod blazeface;
mod device;
mod gender_net;
mod loader;
mod utils;

pub use analyzer::{CandleGenderAnalyzer, ModelPaths, DEFAULT_MIN_FACE_CONFIDENCE};
pub use blazeface::{BlazeFace, DetectedFace};
pub use device::select_device;
pub use gender_net::GenderNet;
pub use loader::load_safetensors;
pub use utils::sigmoid;
