use parse_display::Display;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`Store`](crate::Store) operations.
///
/// Unresolvable macro tokens and oddly shaped paths are never errors; they resolve to
/// "nothing". Only a path that contradicts the shape of the value, a failed conversion
/// between [`Value`](crate::Value) and a typed value, or a failed async producer end up here.
#[non_exhaustive]
#[derive(Display, Debug)]
pub enum Error {
    /// A write tried to descend through a value that cannot hold `key`.
    #[display("cannot address `{key}` inside a {kind} value")]
    PathConflict { key: String, kind: &'static str },

    #[display("value conversion failed: {0}")]
    Convert(serde_json::Error),

    /// The producer passed to an emit helper failed. The snapshot was not touched.
    #[display("emit rejected")]
    Rejected {
        cause: Option<Box<dyn std::error::Error>>,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PathConflict { .. } => None,
            Error::Convert(e) => Some(e),
            Error::Rejected { cause } => cause.as_deref(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Convert(e)
    }
}
