mod error;
mod traits;
mod types;

pub use error::InstallError;
pub use traits::{AssetStore, PartitionMounter, PrivilegedRunner};
pub use types::{InstallOutcome, InstallPhase, InstallProgress, InstallState};
