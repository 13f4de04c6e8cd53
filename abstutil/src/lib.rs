//! The contents of this crate need to be organized better:
//!
//! - Timer (a mix of logging, profiling, and even parallel execution)
//! - Utilities for collections and serialization
//! - Small helpers used while importing map data

#[macro_use]
extern crate log;

mod collections;
pub mod logger;
mod priority_queue;
mod serde;
mod tags;
mod time;
mod utils;

pub use crate::collections::{Counter, MultiMap};
pub use crate::priority_queue::PriorityQueueItem;
pub use crate::serde::{
    deserialize_btreemap, deserialize_multimap, serialize_btreemap, serialize_multimap,
};
pub use crate::tags::Tags;
pub use crate::time::Timer;
pub use crate::utils::prettyprint_usize;

const PROGRESS_FREQUENCY_SECONDS: f64 = 0.2;
