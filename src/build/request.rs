use crate::build::types::BuildStep;
use crate::shared::ids::SessionId;
use crate::workspace::{validate_session_id, FileUpdate};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Malformed request shape.
    BadRequest,
    /// Session id failed validation.
    Forbidden,
}

impl RejectionKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
        }
    }
}

/// A request refused before any filesystem access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestRejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl RequestRejection {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::BadRequest,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::Forbidden,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({ "error": self.message })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub session: SessionId,
    pub build_step: BuildStep,
    pub updates: Vec<FileUpdate>,
}

impl BuildRequest {
    pub fn new(session: SessionId, build_step: BuildStep, updates: Vec<FileUpdate>) -> Self {
        Self {
            session,
            build_step,
            updates,
        }
    }

    /// Validates the request body in a fixed order: required top-level
    /// fields, then the session id, then the build step shape, then the
    /// update list.
    pub fn from_json(raw: &str) -> Result<Self, RequestRejection> {
        let data: Value = serde_json::from_str(raw)
            .map_err(|err| RequestRejection::bad_request(format!("Invalid JSON: {err}")))?;

        let (Some(build_step), Some(updates), Some(session)) = (
            present(&data, "buildStep"),
            present(&data, "updates"),
            present(&data, "sessionID"),
        ) else {
            return Err(RequestRejection::bad_request(
                "Missing required fields: buildStep, updates, or sessionID",
            ));
        };

        let session = session
            .as_str()
            .and_then(|raw| validate_session_id(raw).ok())
            .ok_or_else(|| RequestRejection::forbidden("Invalid sessionID"))?;

        let step_fields_present = ["path", "files", "platform", "tool"]
            .iter()
            .all(|field| present(build_step, field).is_some());
        if !step_fields_present {
            return Err(RequestRejection::bad_request("Invalid buildStep structure"));
        }
        let build_step: BuildStep = serde_json::from_value(build_step.clone()).map_err(|err| {
            RequestRejection::bad_request(format!("Invalid buildStep structure: {err}"))
        })?;

        let non_empty = updates.as_array().is_some_and(|items| !items.is_empty());
        if !non_empty {
            return Err(RequestRejection::bad_request(
                "updates must be a non-empty array",
            ));
        }
        let updates: Vec<FileUpdate> = serde_json::from_value(updates.clone())
            .map_err(|err| RequestRejection::bad_request(format!("Invalid updates: {err}")))?;

        Ok(Self::new(session, build_step, updates))
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|field| !field.is_null())
}
