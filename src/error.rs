use std::fmt;
use std::io;
use crate::http::response::Response;

/// Errors raised while building a route table, reversing a route or serving a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Malformed route pattern
    Pattern {
        pattern: String,
        context: String,
    },
    /// A route name registered twice for different zones
    DuplicateName {
        name: String,
    },
    /// Method outside the supported verb set
    UnknownMethod {
        method: String,
    },
    /// Reversal without a value for one of the route's parameters
    MissingArgument {
        route: String,
        name: String,
    },
    /// Reversal of a name nobody registered
    UnknownRoute {
        name: String,
    },
    /// HTTP parsing errors
    HttpParse {
        context: String,
        status_code: u16,
    },
    /// IO-related errors
    Io {
        context: String,
        kind: io::ErrorKind,
    },
    /// Configuration errors
    Config {
        context: String,
    },
}

impl RouterError {
    /// Create a pattern error with context
    pub fn pattern(pattern: impl Into<String>, context: impl Into<String>) -> Self {
        RouterError::Pattern {
            pattern: pattern.into(),
            context: context.into(),
        }
    }

    /// Create an IO error with context
    pub fn io(context: impl Into<String>, kind: io::ErrorKind) -> Self {
        RouterError::Io {
            context: context.into(),
            kind,
        }
    }

    /// Create a 400 parse error
    pub fn bad_request(context: impl Into<String>) -> Self {
        RouterError::HttpParse {
            context: context.into(),
            status_code: 400,
        }
    }

    /// Convert to HTTP response
    pub fn to_response(&self) -> Response {
        match self {
            RouterError::HttpParse { status_code, context } => {
                Response::create(*status_code, context.clone())
            }
            RouterError::UnknownMethod { method } => {
                Response::create(501, format!("Method {} not implemented", method))
            }
            _ => Response::create(500, "Internal Server Error".to_string()),
        }
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::Pattern { pattern, context } => {
                write!(f, "Invalid route pattern '{}': {}", pattern, context)
            }
            RouterError::DuplicateName { name } => {
                write!(f, "Route name already registered: {}", name)
            }
            RouterError::UnknownMethod { method } => {
                write!(f, "Unknown HTTP method: {}", method)
            }
            RouterError::MissingArgument { route, name } => {
                write!(f, "Missing argument: {} (route {})", name, route)
            }
            RouterError::UnknownRoute { name } => {
                write!(f, "Route not found: {}", name)
            }
            RouterError::HttpParse { context, status_code } => {
                write!(f, "HTTP parse error ({}): {}", status_code, context)
            }
            RouterError::Io { context, kind } => {
                write!(f, "IO error ({}): {}", kind, context)
            }
            RouterError::Config { context } => {
                write!(f, "Configuration error: {}", context)
            }
        }
    }
}

impl std::error::Error for RouterError {}

impl From<io::Error> for RouterError {
    fn from(error: io::Error) -> Self {
        RouterError::io(error.to_string(), error.kind())
    }
}

/// Result type alias for routing operations
pub type RouterResult<T> = Result<T, RouterError>;

/// Extension trait for attaching context to errors
pub trait ResultExt<T> {
    /// Replace the error's context message
    fn context(self, context: impl Into<String>) -> RouterResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<RouterError>,
{
    fn context(self, context: impl Into<String>) -> RouterResult<T> {
        self.map_err(|e| {
            let mut err = e.into();
            match &mut err {
                RouterError::Io { context: ctx, .. } => *ctx = context.into(),
                RouterError::HttpParse { context: ctx, .. } => *ctx = context.into(),
                RouterError::Pattern { context: ctx, .. } => *ctx = context.into(),
                RouterError::Config { context: ctx } => *ctx = context.into(),
                _ => {}
            }
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let io_err = io::Error::new(io::ErrorKind::AddrInUse, "address in use");
        let result: Result<(), io::Error> = Err(io_err);

        let err = result.context("Binding 127.0.0.1:8080").unwrap_err();
        assert!(matches!(err, RouterError::Io { kind: io::ErrorKind::AddrInUse, .. }));
        assert!(err.to_string().contains("Binding 127.0.0.1:8080"));
    }

    #[test]
    fn test_error_to_response() {
        let response = RouterError::bad_request("Malformed request line").to_response();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.response_body, "Malformed request line");

        let response = RouterError::UnknownMethod { method: "BREW".to_string() }.to_response();
        assert_eq!(response.status_code, 501);

        let response = RouterError::UnknownRoute { name: "home".to_string() }.to_response();
        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn test_reversal_messages() {
        let missing = RouterError::MissingArgument {
            route: "user".to_string(),
            name: "id".to_string(),
        };
        assert_eq!(missing.to_string(), "Missing argument: id (route user)");
        assert_eq!(
            RouterError::UnknownRoute { name: "nope".to_string() }.to_string(),
            "Route not found: nope"
        );
    }
}
