pub mod checkpoints;
pub mod genesis;
pub mod params;
