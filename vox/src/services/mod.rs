mod assignment;
mod chat;
mod feedback;
mod refresh;
mod scheduler;

pub use assignment::{TeamAssignmentService, TRIAGE_TEAM};
pub use chat::{ChatAnswer, ChatService, RelatedFeedback, RelatedTicket};
pub use feedback::FeedbackService;
pub use refresh::RefreshEngine;
pub use scheduler::{RefreshScheduler, ScheduleDecision, FULL_SCHEDULE, INCREMENTAL_SCHEDULE};
