mod abi;
mod paths;

pub use abi::host_abi;
pub use paths::{AppPaths, AppPathsError};
