pub mod calendar;
pub mod goals;
pub mod recalc;
pub mod scheduler;
pub mod summary;
