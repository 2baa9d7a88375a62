pub mod classifier;
pub mod detectors;
pub mod generation;
pub mod repair;
pub mod rewriter;

pub use classifier::HttpIntentClassifier;
pub use detectors::builtin_detectors;
pub use generation::{HttpGenerationTransport, ResilientGenerationClient};
pub use rewriter::HttpPromptRewriter;
