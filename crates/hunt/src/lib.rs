pub mod logging;
pub mod walk;

pub use walk::{scripted_walk, seed_documents, WalkReport};
