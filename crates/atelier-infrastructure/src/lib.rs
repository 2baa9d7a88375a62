pub mod history_repository;
pub mod paths;
pub mod secret_store;

pub use history_repository::JsonHistoryRepository;
pub use paths::AtelierPaths;
pub use secret_store::{SecretConfig, SecretStore};
