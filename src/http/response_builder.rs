use super::headers::Headers;
use super::response::Response;

/// Consuming builder for [`Response`]
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status_code: u16,
    headers: Headers,
    body: Option<String>,
}

impl ResponseBuilder {
    pub fn new(status_code: u16) -> Self {
        ResponseBuilder {
            status_code,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_error() -> Self {
        Self::new(500)
    }

    pub fn header(self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let mut headers = self.headers;
        headers.insert(key, value);
        ResponseBuilder { headers, ..self }
    }

    pub fn body(self, body: impl Into<String>) -> Self {
        ResponseBuilder {
            body: Some(body.into()),
            ..self
        }
    }

    pub fn build(self) -> Response {
        Response {
            status_code: self.status_code,
            headers: self.headers,
            response_body: self.body.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_headers() {
        let response = ResponseBuilder::new(200)
            .header("X-Custom", "value")
            .body("Hello, World!")
            .build();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.response_body, "Hello, World!");
        assert_eq!(response.headers.get("x-custom"), Some("value"));
    }

    #[test]
    fn empty_body_by_default() {
        let response = ResponseBuilder::not_found().build();
        assert_eq!(response.status_code, 404);
        assert!(response.response_body.is_empty());
        assert!(response.headers.is_empty());
    }
}
