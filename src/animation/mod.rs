pub mod data;
pub mod ease;
pub mod param;
pub mod sequence;
pub mod value;
