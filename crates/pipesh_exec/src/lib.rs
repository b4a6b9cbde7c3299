mod error;
mod executor;
mod exit;
mod session;

#[cfg(test)]
mod tests;

pub use error::{ExecError, ExecResult};
pub use executor::{ExitInfo, PipelineExecutor, StandardStreams};
pub use exit::{EXIT_GENERAL_ERROR, EXIT_SUCCESS};
pub use session::{Session, State};
