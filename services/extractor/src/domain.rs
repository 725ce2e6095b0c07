// Domain layer modules
pub mod extract_request;
pub mod queue_message;
pub mod user;

// Re-exports
pub use extract_request::{ExtractUserRequest, RequestParseError};
pub use queue_message::{QueueMessage, QueueMessageError};
pub use user::User;
