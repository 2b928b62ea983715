pub use crate::app::App;
pub use mapmart_types::error::{ClResult, Error};
pub use mapmart_types::types::{Timestamp, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
