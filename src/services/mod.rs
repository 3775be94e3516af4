pub mod campaign_service;
pub mod checkin_service;
pub mod lottery_service;
pub mod points_service;
pub mod renew_service;

pub use campaign_service::*;
pub use checkin_service::*;
pub use lottery_service::*;
pub use points_service::*;
pub use renew_service::*;
