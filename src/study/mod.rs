//! Study sessions over a loaded question table

mod mode;
mod session;

pub use mode::{resolve_range, select_questions, RangeFilter, StudyMode};
pub use session::StudySession;
