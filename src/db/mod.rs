pub mod goal_store;
mod pool;

pub use goal_store::{GoalStore, PgGoalStore};
pub use pool::create_pool;
