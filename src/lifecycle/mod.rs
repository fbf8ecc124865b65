//! Lead lifecycle: stage transition rules, the optimistic lead board, and the
//! pipeline service that persists moves.

pub mod board;
pub mod pipeline;
pub mod transitions;

pub use board::{BoardEntry, LeadBoard, PendingWrite, ReconcileSummary, TransitionRecord};
pub use pipeline::LeadPipeline;
pub use transitions::{
    allowed_targets, can_transition, lifecycle_message, validate, validate_status, RejectReason,
    TransitionOutcome, TransitionSource,
};
