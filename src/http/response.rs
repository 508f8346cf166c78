use crate::http::headers::Headers;
use crate::http::http_status::HttpStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub headers: Headers,
    pub response_body: String,
}

impl Response {
    pub fn create(status_code: u16, response_body: String) -> Response {
        Response {
            status_code,
            headers: Headers::new(),
            response_body,
        }
    }

    pub fn get_status_line(&self) -> String {
        format!(
            "HTTP/1.1 {status_code} {reason}",
            status_code = self.status_code,
            reason = HttpStatus::reason(self.status_code)
        )
    }

    /// Serializes the response, filling in `Content-Length`
    pub fn to_http_string(&self) -> String {
        let mut headers = self.headers.clone();
        if !headers.contains_key("content-length") {
            headers.insert("Content-Length", self.response_body.len().to_string());
        }
        format!("{}\r\n{}\r\n{}", self.get_status_line(), headers, self.response_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_status_headers_and_body() {
        let mut response = Response::create(404, "Resource: /x not found.".to_string());
        response.headers.insert("Content-Type", "text/plain");

        assert_eq!(
            response.to_http_string(),
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 23\r\n\r\nResource: /x not found."
        );
    }

    #[test]
    fn empty_body_still_gets_a_length() {
        let http = Response::create(204, String::new()).to_http_string();
        assert!(http.ends_with("Content-Length: 0\r\n\r\n"));
    }
}
