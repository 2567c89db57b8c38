mod assets;
mod error;
mod mounts;
mod runner;

pub use assets::DirAssetStore;
pub use error::RootError;
pub use mounts::{MountEntry, ProcMountsMounter, parse_mounts};
pub use runner::{PkexecRunner, RunnerKind, SuRunner, detect_runner, resolve_runner};
