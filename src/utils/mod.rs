pub mod command;
pub mod fastx;
pub mod file;
pub mod reads;
pub mod report;
pub mod stats;
