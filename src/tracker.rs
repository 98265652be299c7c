//! Price-history tracking: persistence, scheduling and the check cycle

pub mod engine;
pub mod schedule;
pub mod store;

pub use engine::PriceTracker;
pub use schedule::TrackerSchedule;
pub use store::TrackerStore;
