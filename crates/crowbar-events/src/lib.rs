pub mod dispatcher;
pub mod indexed;

pub use dispatcher::{EventDispatcher, HandlerId, HandlerPriority};
pub use indexed::IndexedEventDispatcher;
