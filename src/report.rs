//! The two-field result every run ends with.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::error;

use crate::ca::CaOutcome;
use crate::error::{PrivCaError, Result};
use crate::tls::IssuedLeaf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub status: Status,
    pub message: String,
}

impl Report {
    pub fn ok(message: impl Into<String>) -> Self {
        Report {
            status: Status::Ok,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Report {
            status: Status::Failed,
            message: message.into(),
        }
    }

    /// `0` for ok, `1` for failed.
    pub fn exit_code(&self) -> u8 {
        match self.status {
            Status::Ok => 0,
            Status::Failed => 1,
        }
    }

    /// Renders the report as JSON indented by four spaces.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| PrivCaError::EncodingError(e.to_string()))
    }

    pub fn from_ca_result(ca_name: &str, result: &Result<CaOutcome>) -> Self {
        match result {
            Ok(CaOutcome::Created) => Report::ok(format!(
                "The CA ({ca_name}) has successfully been registered on the database."
            )),
            Ok(CaOutcome::AlreadyRegistered { .. }) => Report::ok(format!(
                "The CA ({ca_name}) is already registered on the database."
            )),
            Err(err) => Report::from_error(err),
        }
    }

    pub fn from_tls_result(result: &Result<IssuedLeaf>) -> Self {
        match result {
            Ok(leaf) => Report::ok(format!(
                "The TLS certificate has been created for the FQDN ({}).",
                leaf.primary
            )),
            Err(err) => Report::from_error(err),
        }
    }

    fn from_error(err: &PrivCaError) -> Self {
        error!(error = %err, "operation failed");
        match err {
            PrivCaError::ArtifactGeneration {
                artifact,
                identifier,
                ..
            } => Report::failed(artifact.failure_message(identifier)),
            PrivCaError::NotRegistered { ca_name } => Report::failed(format!(
                "The CA ({ca_name}) is not registered yet in the database."
            )),
            other => Report::failed(other.to_string()),
        }
    }
}
