pub mod project;
pub mod sync;
pub mod team;
pub mod time_entry;
