use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Redirect,
    Transport,
    Decode,
    Abort,
    Other,
}

impl ErrorClass {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorClass::Input => 2,
            ErrorClass::Redirect => 3,
            ErrorClass::Transport => 4,
            ErrorClass::Decode => 5,
            ErrorClass::Abort => 6,
            ErrorClass::Other => 1,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ErrorClass::Input => "INPUT",
            ErrorClass::Redirect => "REDIRECT",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Decode => "DECODE",
            ErrorClass::Abort => "ABORT",
            ErrorClass::Other => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchError {
    pub class: ErrorClass,
    pub message: String,
}

impl FetchError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self { class, message: message.into() }
    }

    pub fn input(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Input, msg) }
    pub fn redirect(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Redirect, msg) }
    pub fn transport(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Transport, msg) }
    pub fn decode(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Decode, msg) }
    pub fn abort(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Abort, msg) }
    pub fn other(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Other, msg) }

    pub fn is_abort(&self) -> bool {
        self.class == ErrorClass::Abort
    }

    pub fn format_stderr(&self) -> String {
        format!("error[{}]: {}", self.class.tag(), self.message)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FetchError {}
