pub mod assemble;
pub mod result;
pub mod types;
