pub mod jwt;
pub mod keyed_lock;
pub mod series;
pub mod shuffle;

pub use jwt::*;
pub use keyed_lock::KeyedLock;
pub use series::{base_title, next_series_title, series_number};
pub use shuffle::{fisher_yates, pick_winners};
