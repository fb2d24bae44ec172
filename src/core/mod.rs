pub mod event;
pub mod listener;
pub mod router;
pub mod supervisor;

pub use event::{DomainEvent, EventKind};
pub use router::EventRouter;
pub use supervisor::{Supervisor, SupervisorError};
