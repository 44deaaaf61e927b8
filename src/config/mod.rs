pub mod defs;
pub mod params;
