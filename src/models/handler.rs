use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A single allowed `(path, verb)` pair of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub path_part: String,
    pub method_type: String,
}

impl Method {
    pub fn new(path_part: impl Into<String>, method_type: impl Into<String>) -> Self {
        Self {
            path_part: path_part.into(),
            method_type: method_type.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.path_part.is_empty() {
            return Err("path_part is required".to_string());
        }
        if self.method_type.is_empty() {
            return Err("method_type is required".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method_type, self.path_part)
    }
}

/// Registration payload: base socket address plus the allow-list of methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub socket: String,
    pub methods: Vec<Method>,
}

impl Specification {
    pub fn new(socket: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            socket: socket.into(),
            methods,
        }
    }

    /// Checks required fields and the socket URL syntax.
    ///
    /// Returns every violation found, in field order.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.socket.is_empty() {
            errors.push("socket is required".to_string());
        } else if Url::parse(&self.socket).is_err() {
            errors.push(format!("socket '{}' is not a valid url", self.socket));
        }

        if self.methods.is_empty() {
            errors.push("methods must contain at least one entry".to_string());
        }

        for (index, method) in self.methods.iter().enumerate() {
            if let Err(e) = method.validate() {
                errors.push(format!("methods[{}]: {}", index, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Exact structural lookup, no pattern matching.
    pub fn allows(&self, path: &str, method: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m.path_part == path && m.method_type == method)
    }

    /// Target URL for a path on this handler's socket.
    pub fn target_url(&self, path: &str) -> String {
        format!("{}{}", self.socket, path)
    }
}

/// A persisted handler as listed by the store.
#[derive(Debug, Clone, Serialize)]
pub struct Handler {
    pub id: String,
    pub specification: Specification,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerIdRequest {
    pub handler_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub handler_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub handler_id: String,
    pub specification: Specification,
}
