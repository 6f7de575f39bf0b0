//! Container types backing the schema graph

pub mod ordered;
pub mod priority_queue;
pub mod table;

pub use ordered::OrderedMap;
pub use priority_queue::{PriorityQueue, QueueError};
pub use table::{HyperTable, Table};
