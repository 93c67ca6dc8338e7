pub mod coordinator;
pub mod gesture;
pub mod queue;
pub mod resolver;
pub mod sampler;
pub mod state_machine;
pub mod timers;
pub mod types;

pub use coordinator::{SessionCoordinator, SessionHandle, SessionPorts};
pub use types::{SessionIn, SessionOut};
