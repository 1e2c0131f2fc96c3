pub mod board;
pub mod generator;
pub mod piece_specs;
