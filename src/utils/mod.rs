pub mod code_generator;
pub mod contact;
pub mod establishment;
pub mod jwt;
pub mod redemption_token;

pub use code_generator::generate_prize_code;
pub use contact::{normalize_email, normalize_phone};
pub use establishment::{MAX_ESTABLISHMENT_ID_LEN, validate_establishment_id};
pub use jwt::*;
pub use redemption_token::{RedemptionToken, TOKEN_KIND, TOKEN_NAMESPACE};
