pub mod game;
pub mod staff;

pub use game::game_config;
pub use staff::staff_config;
