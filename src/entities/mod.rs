pub mod campaign_participants;
pub mod campaigns;
pub mod checkins;
pub mod lotteries;
pub mod lottery_entries;
pub mod point_logs;
pub mod users;

pub use campaign_participants as participant_entity;
pub use campaigns as campaign_entity;
pub use checkins as checkin_entity;
pub use lotteries as lottery_entity;
pub use lottery_entries as lottery_entry_entity;
pub use point_logs as point_log_entity;
pub use users as user_entity;

pub use campaigns::{CampaignStatus, derive_status};
pub use lotteries::LotteryStatus;
pub use point_logs::PointKind;
pub use users::UserRole;
