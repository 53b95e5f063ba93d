pub mod browse;
pub mod dashboard;
pub mod resources;
