pub mod campaign;
pub mod lottery;
pub mod pagination;
pub mod points;

pub use campaign::*;
pub use lottery::*;
pub use pagination::*;
pub use points::*;
