pub mod achievements_seed;
