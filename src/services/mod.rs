pub mod catalog;
pub mod llm;
pub mod merge;
pub mod recommendations;
pub mod similarity;

pub use catalog::{CatalogProvider, InMemoryCatalog};
pub use llm::{LlmRanker, OpenAiCompletions, RankingBackend, RankingOutcome};
pub use recommendations::RecommendationService;
