//! In-memory adapters for task ports.

mod sink;
mod task;

pub use sink::RecordingMutationSink;
pub use task::InMemoryTaskRepository;
