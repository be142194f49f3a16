pub mod lifecycle;
pub mod queries;

pub use lifecycle::{CreateMeetingRequest, MeetingLifecycle};
