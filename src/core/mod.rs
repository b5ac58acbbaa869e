pub mod classifier;
pub mod config;
pub mod model;
pub mod scale;
pub mod scheduler;

pub use classifier::PlasmidClassifier;
pub use config::Config;
pub use scheduler::ClassificationScheduler;
