pub mod dispatch;
pub mod geo;
pub mod loader;
pub mod ranker;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use dispatch::DispatchEngine;
pub use loader::CandidatePoolLoader;
pub use ranker::AreaDistanceRanker;
pub use resolver::ConflictResolver;
pub use snapshot::SnapshotStore;
pub use store::{DispatchStore, SupabaseDispatchStore};
