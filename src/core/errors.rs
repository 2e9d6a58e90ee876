use std::fmt::Display;

use thiserror::Error;

use super::Loc;

type Internal = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The stage of processing which raised an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexical or grammatical problems in the source text.
    Language,
    /// Problems found by static resolution, before anything runs.
    Resolution,
    /// Problems raised while executing a program.
    Runtime,
    User,
    System,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ErrorKind::Language => write!(f, "language"),
            ErrorKind::Resolution => write!(f, "resolution"),
            ErrorKind::Runtime => write!(f, "runtime"),
            ErrorKind::User => write!(f, "user"),
            ErrorKind::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoxError {
    #[error("[{loc}] Error: {description}\n  Advice: {advice}")]
    Language {
        loc: Loc,
        description: String,
        advice: String,
    },

    #[error("[{loc}] Error: {description}\n  Advice: {advice}")]
    Resolution {
        loc: Loc,
        description: String,
        advice: String,
    },

    #[error("[{loc}] Runtime error: {description}\n  Advice: {advice}")]
    Runtime {
        loc: Loc,
        description: String,
        advice: String,
    },

    #[error("{description}\n  Advice: {advice}")]
    User {
        description: String,
        advice: String,
        #[source]
        internal: Option<Internal>,
    },

    #[error("{description}\n  Advice: {advice}")]
    System {
        description: String,
        advice: String,
        #[source]
        internal: Option<Internal>,
    },
}

impl LoxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoxError::Language { .. } => ErrorKind::Language,
            LoxError::Resolution { .. } => ErrorKind::Resolution,
            LoxError::Runtime { .. } => ErrorKind::Runtime,
            LoxError::User { .. } => ErrorKind::User,
            LoxError::System { .. } => ErrorKind::System,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn description(&self) -> &str {
        match self {
            LoxError::Language { description, .. }
            | LoxError::Resolution { description, .. }
            | LoxError::Runtime { description, .. }
            | LoxError::User { description, .. }
            | LoxError::System { description, .. } => description,
        }
    }

    pub fn advice(&self) -> &str {
        match self {
            LoxError::Language { advice, .. }
            | LoxError::Resolution { advice, .. }
            | LoxError::Runtime { advice, .. }
            | LoxError::User { advice, .. }
            | LoxError::System { advice, .. } => advice,
        }
    }

    pub fn loc(&self) -> Loc {
        match self {
            LoxError::Language { loc, .. }
            | LoxError::Resolution { loc, .. }
            | LoxError::Runtime { loc, .. } => *loc,
            LoxError::User { .. } | LoxError::System { .. } => Loc::Native,
        }
    }

    /// The 1-based source line this error refers to, if it refers to one.
    pub fn line(&self) -> Option<usize> {
        self.loc().line()
    }

    /// Attributes a runtime error raised in native code to `loc`, the point in
    /// the program which called into it. Other errors are returned unchanged.
    pub fn at(self, loc: Loc) -> Self {
        match self {
            LoxError::Runtime { loc: Loc::Native, description, advice } => LoxError::Runtime { loc, description, advice },
            other => other,
        }
    }
}

pub fn language<D: Into<String>, A: Into<String>>(loc: Loc, description: D, advice: A) -> LoxError {
    LoxError::Language {
        loc,
        description: description.into(),
        advice: advice.into(),
    }
}

pub fn resolution<D: Into<String>, A: Into<String>>(loc: Loc, description: D, advice: A) -> LoxError {
    LoxError::Resolution {
        loc,
        description: description.into(),
        advice: advice.into(),
    }
}

pub fn runtime<D: Into<String>, A: Into<String>>(loc: Loc, description: D, advice: A) -> LoxError {
    LoxError::Runtime {
        loc,
        description: description.into(),
        advice: advice.into(),
    }
}

pub fn user<D: Into<String>, A: Into<String>>(description: D, advice: A) -> LoxError {
    LoxError::User {
        description: description.into(),
        advice: advice.into(),
        internal: None,
    }
}

pub fn user_with_internal<D: Into<String>, A: Into<String>, E: Into<Internal>>(description: D, advice: A, internal: E) -> LoxError {
    LoxError::User {
        description: description.into(),
        advice: advice.into(),
        internal: Some(internal.into()),
    }
}

pub fn system<D: Into<String>, A: Into<String>>(description: D, advice: A) -> LoxError {
    LoxError::System {
        description: description.into(),
        advice: advice.into(),
        internal: None,
    }
}

pub fn system_with_internal<D: Into<String>, A: Into<String>, E: Into<Internal>>(description: D, advice: A, internal: E) -> LoxError {
    LoxError::System {
        description: description.into(),
        advice: advice.into(),
        internal: Some(internal.into()),
    }
}

impl From<std::io::Error> for LoxError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => user_with_internal(
                "We could not find the file you provided.",
                "Make sure that the file exists and that you have permissions to access it.",
                e,
            ),
            std::io::ErrorKind::PermissionDenied => user_with_internal(
                "You do not have permissions to access the file you provided.",
                "Make sure that you have permissions to access the file.",
                e,
            ),
            std::io::ErrorKind::InvalidData => user_with_internal(
                "The data you provided is not valid UTF-8 text.",
                "Make sure that your source files and program output are UTF-8 encoded.",
                e,
            ),
            kind => system_with_internal(
                format!("We were unable to complete an I/O operation due to a {} error.", kind),
                "Check the internal error message and try searching for a solution online.",
                e,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_errors_report_their_line() {
        let err = resolution(Loc::new(3), "Already a variable named 'a' in this scope.", "Rename it.");
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(err.line(), Some(3));
        assert_eq!(
            format!("{}", err),
            "[line 3] Error: Already a variable named 'a' in this scope.\n  Advice: Rename it."
        );
    }

    #[test]
    fn native_runtime_errors_can_be_relocated() {
        let err = runtime(Loc::Native, "Assertion failed: boom", "Fix it.").at(Loc::new(7));
        assert_eq!(err.line(), Some(7));

        let err = runtime(Loc::new(2), "Operands must be numbers.", "Fix it.").at(Loc::new(7));
        assert_eq!(err.line(), Some(2), "errors which already have a location keep it");
    }

    #[test]
    fn io_errors_become_user_errors() {
        let err: LoxError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(err.is(ErrorKind::User));
        assert_eq!(err.line(), None);
        assert!(std::error::Error::source(&err).is_some());
    }
}
