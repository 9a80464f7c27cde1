pub mod openai_compatible;
pub mod scripted;
pub mod traits;

pub use openai_compatible::OpenAiCompatibleDecisionMaker;
pub use scripted::ScriptedDecisionMaker;
pub use traits::{DecisionMaker, ModelResponse, ProviderError};
