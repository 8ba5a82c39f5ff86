mod feedback;
mod fields;
mod status;
mod ticket;

pub use feedback::*;
pub use fields::*;
pub use status::*;
pub use ticket::*;
