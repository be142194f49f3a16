pub mod meeting;
pub mod property;

pub use meeting::{Meeting, MeetingStatus};
pub use property::PropertySummary;
