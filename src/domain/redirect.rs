use crate::domain::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    #[default]
    Follow,
    Manual,
    Error,
}

impl RedirectMode {
    pub fn parse(value: &str) -> Result<Self, FetchError> {
        match value {
            "follow" => Ok(RedirectMode::Follow),
            "manual" => Ok(RedirectMode::Manual),
            "error" => Ok(RedirectMode::Error),
            other => Err(FetchError::input(format!(
                "Request constructor: {} is not an accepted type. Expected one of follow, manual, error.",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectMode::Follow => "follow",
            RedirectMode::Manual => "manual",
            RedirectMode::Error => "error",
        }
    }
}
