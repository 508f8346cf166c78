use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{RouterError, RouterResult};

/// The HTTP verbs a route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
    Put,
    Patch,
    Connect,
    Head,
    Options,
    Trace,
}

impl Method {
    /// Every verb, in the order `"*"` expands to
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Post,
        Method::Delete,
        Method::Put,
        Method::Patch,
        Method::Connect,
        Method::Head,
        Method::Options,
        Method::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Connect => "CONNECT",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }

    /// Expands a method list: `"*"` is every verb, anything else a comma separated list.
    pub fn parse_list(list: &str) -> RouterResult<Vec<Method>> {
        if list.trim() == "*" {
            return Ok(Method::ALL.to_vec());
        }
        let mut methods = Vec::new();
        for method in list.split(',').map(str::parse::<Method>) {
            let method = method?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(methods)
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RouterError::UnknownMethod {
                method: trimmed.to_string(),
            })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_expands_to_every_verb() {
        let methods = Method::parse_list("*").unwrap();
        assert_eq!(methods.len(), 9);
        assert_eq!(methods[0], Method::Get);
        assert_eq!(methods[8], Method::Trace);
    }

    #[test]
    fn comma_lists_are_trimmed_and_deduplicated() {
        let methods = Method::parse_list("get, POST,Get").unwrap();
        assert_eq!(methods, vec![Method::Get, Method::Post]);
    }

    #[test]
    fn unknown_verbs_are_rejected() {
        let err = Method::parse_list("GET,BREW").unwrap_err();
        assert_eq!(err, RouterError::UnknownMethod { method: "BREW".to_string() });
        assert!("".parse::<Method>().is_err());
    }

    #[test]
    fn serializes_as_uppercase() {
        assert_eq!(serde_json::to_string(&Method::Options).unwrap(), "\"OPTIONS\"");
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }
}
