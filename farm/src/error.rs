//! Farm errors

use rayfarm_api::SceneError;
use rayfarm_net::NetError;
use thiserror::Error;

/// Errors that end a coordinator or worker.
#[derive(Error, Debug)]
pub enum FarmError {
    /// Transport or protocol failure.
    #[error(transparent)]
    Net(#[from] NetError),

    /// The scene could not be built.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The job did not finish in time.
    #[error("deadline exceeded with {pending} work units outstanding")]
    DeadlineExceeded { pending: usize },
}
