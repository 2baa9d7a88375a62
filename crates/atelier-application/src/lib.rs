pub mod orchestrator;

pub use orchestrator::{TurnOutcome, VolleyOrchestrator};
