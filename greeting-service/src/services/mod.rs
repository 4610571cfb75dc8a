pub mod cleaner;
pub mod fallback;
pub mod generator;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use fallback::{FallbackSelection, FallbackTable};
pub use generator::{GenerationConfig, Generator, StructuralErrorPolicy};
pub use prompt::PromptBuilder;
