pub mod atmosphere;
pub mod controller;
pub mod download;
pub mod effects;
pub mod overlay;
pub mod series;
pub mod stage;
