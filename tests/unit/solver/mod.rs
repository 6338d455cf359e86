pub mod general;
pub mod model;
pub mod ranking;
pub mod visited;
