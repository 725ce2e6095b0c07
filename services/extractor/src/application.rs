// Application layer modules
pub mod enqueue_handler;
pub mod extract_user_handler;
pub mod worker_processor;

// Re-exports
pub use enqueue_handler::{EnqueueError, EnqueueHandler};
pub use extract_user_handler::{ExtractUserError, ExtractUserHandler};
pub use worker_processor::{ProcessResult, WorkerProcessor};
