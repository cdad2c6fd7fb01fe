/// Ways a run stops that map to a specific exit code.
///
/// Anything else bubbling up as an [`anyhow::Error`] exits with `1`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Abort {
    #[error("Aborting")]
    Declined,

    #[error("`{program}` exited with status {code}")]
    ToolFailed { program: String, code: i32 },

    #[error("`{program}` was terminated by a signal")]
    ToolKilled { program: String },
}

impl Abort {
    /// Exit code the process should end with.
    ///
    /// A failing tool's own code is propagated when it fits in a `u8`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Abort::Declined | Abort::ToolKilled { .. } => 1,
            Abort::ToolFailed { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Abort;

    #[test]
    fn exit_codes() {
        assert_eq!(Abort::Declined.exit_code(), 1);
        assert_eq!(
            Abort::ToolFailed {
                program: "poetry".into(),
                code: 3
            }
            .exit_code(),
            3
        );
        assert_eq!(
            Abort::ToolFailed {
                program: "git".into(),
                code: 300
            }
            .exit_code(),
            1
        );
        assert_eq!(
            Abort::ToolKilled {
                program: "pip".into()
            }
            .exit_code(),
            1
        );
    }
}
