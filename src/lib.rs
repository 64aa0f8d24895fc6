// Event propagation and resumable tree mutation for a browser-style
// document engine driven by a single cooperative script thread.

pub mod dispatch;
pub mod environment;
pub mod event;
pub mod notify;
pub mod ops;
pub mod registry;
pub mod resume;
pub mod scheduler;
pub mod tree;

// Re-export the types most callers and tests reach for
pub use dispatch::{dispatch_event, DispatchError, DispatchOutcome};
pub use environment::{Environment, ListenerId, SendOutcome, TraceEntry, TypeKey};
pub use event::{Event, EventLifecycle, EventPayload, EventPhase, ListenerGroup, ScriptValue};
pub use ops::OpError;
pub use registry::{EventType, TargetKind, TypeFlags};
pub use resume::{drive, Continuation, OpOutcome, OpValue, ResumeError};
pub use scheduler::{Scheduler, ScriptThread, ThreadId};
pub use tree::{Document, NodeId};
