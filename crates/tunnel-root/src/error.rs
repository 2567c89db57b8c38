use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootError {
    #[error("No privilege helper found (tried su, pkexec)")]
    NoRunner,

    #[error("Privilege helper {0} not found in PATH")]
    RunnerNotFound(&'static str),

    #[error("Unknown privilege helper: {0}")]
    UnknownRunner(String),
}

#[cfg(test)]
mod tests {
    use super::RootError;

    #[test]
    fn runner_not_found_names_program() {
        let error = RootError::RunnerNotFound("pkexec");

        assert_eq!(error.to_string(), "Privilege helper pkexec not found in PATH");
    }

    #[test]
    fn unknown_runner_keeps_input() {
        let error = RootError::UnknownRunner("doas".to_string());

        assert_eq!(error.to_string(), "Unknown privilege helper: doas");
    }
}
