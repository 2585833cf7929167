//! On-disk stores: the question table and the flag store

mod flags;
mod table;

pub use flags::FlagStore;
pub use table::{write_table, QuestionTable};
