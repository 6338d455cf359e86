pub mod align;
pub mod float;
