pub mod aggregate;
pub mod assemble;
pub mod megahit;
pub mod resolve;
