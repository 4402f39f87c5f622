#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// The frames of a trajectory disagree on atom count or species ordering
    InconsistentData(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::InconsistentData(e) => write!(f, "inconsistent data: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::InconsistentData(_) => None,
        }
    }
}
