pub mod core;
pub mod integrity;
pub mod seed;
pub mod stats;
pub mod tasks;
