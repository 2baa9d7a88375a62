//! Session domain model and persistence contract.

pub mod model;
pub mod repository;

pub use model::{SessionHistory, Volley};
pub use repository::HistoryRepository;
