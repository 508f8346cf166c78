use log::warn;

// https://developer.mozilla.org/en-US/docs/Web/HTTP/Status
pub struct HttpStatus;

impl HttpStatus {
    /// Reason phrase for `code`; unknown codes get a generic phrase per class.
    pub fn reason(code: u16) -> &'static str {
        match code {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            411 => "Length Required",
            413 => "Content Too Large",
            415 => "Unsupported Media Type",
            418 => "I'm a teapot",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            505 => "HTTP Version Not Supported",
            _ => {
                warn!("No reason phrase defined for status code {}", code);
                match code / 100 {
                    1 => "Informational",
                    2 => "Success",
                    3 => "Redirection",
                    4 => "Client Error",
                    _ => "Server Error",
                }
            }
        }
    }

    pub fn is_redirect(code: u16) -> bool {
        matches!(code, 301 | 302 | 303 | 307 | 308)
    }
}
