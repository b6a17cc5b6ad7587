pub mod draw_service;
pub mod inventory;
pub mod ledger_service;
pub mod prize_service;
pub mod redemption_service;
pub mod selector;

pub use draw_service::*;
pub use ledger_service::*;
pub use prize_service::*;
pub use redemption_service::*;
