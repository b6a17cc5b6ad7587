pub mod participants;
pub mod prizes;

pub use participants as participant_entity;
pub use prizes as prize_entity;
