//! face-sort adapters: the filesystem input surface, the zip archive encoder
//! and the model weight store.

pub mod archive;
pub mod fs;
pub mod models;

pub use archive::ZipArchiveEncoder;
pub use fs::FsImageSource;
pub use models::{default_models_dir, ModelInfo, ModelStore, MODELS};
