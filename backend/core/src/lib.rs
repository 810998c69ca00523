pub mod error;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::ArgotError;
pub use traits::{EntityDirectory, LinkProbe, TeamDirectory};
pub use types::{ChannelId, EntityId, EntityRef, PermissionLevel, ScopeId, TeamRef};
