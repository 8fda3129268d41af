pub mod checks;
pub mod seed;
