pub mod chunks;
pub mod edges;
pub mod labels;
pub mod synthetic;
