mod feedback;
mod status;
mod tickets;

pub use feedback::FeedbackRepository;
pub use status::StatusRepository;
pub use tickets::TicketRepository;
