pub mod error;
pub mod graph;
pub mod model;
pub mod pooling;
pub mod similarity;

#[cfg(feature = "onnx")]
pub mod hub;
#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "reference")]
pub mod reference;

pub use error::EmbeddingError;
pub use graph::{HiddenStateGraph, Invocation};
pub use model::{
    EmbeddingConfig, EmbeddingProvider, ExportableProvider, TokenBatch, tokenize_with,
};
pub use pooling::{MASK_EPSILON, mean_pool};
pub use similarity::{cosine_similarity, l2_distance};

#[cfg(feature = "onnx")]
pub use hub::{HubConfig, ensure_model_downloaded};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxArtifactGraph, OnnxSourceModel};
#[cfg(feature = "reference")]
pub use reference::T5ReferenceModel;

/// Dimension of gtr-t5-base embeddings
pub const EMBEDDING_DIM: usize = 768;

/// Maximum sequence length accepted by T5 encoders
pub const MAX_TOKENS: usize = 512;
