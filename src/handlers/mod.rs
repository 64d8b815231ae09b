pub mod health;
pub mod trades;
