pub mod service;
pub mod session;
pub mod shared;

pub use session::{SessionCoordinator, SessionHandle, SessionIn, SessionOut, SessionPorts};
pub use shared::{config, entities, error, logging, ports};
