//! JSON request/response contract.
//!
//! One request yields one response carrying the same `id`. Part maps are
//! keyed by wire names (`proof`, `outer-front`, ...); a failed part group
//! collapses to a single `<group>-error` entry.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::Resolution;
use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::mould::{
    Engine, ExportBlobs, MeshData, MouldParameters, PartOutcome, PlasterMix, Profile,
    VolumeReport,
};

/// A request addressed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Revolve {
        profile: Profile,
    },
    GenerateMould {
        profile: Profile,
        #[serde(default)]
        params: MouldParameters,
    },
    CalculateVolumes {
        profile: Profile,
        #[serde(default)]
        params: MouldParameters,
    },
    ExportParts {
        profile: Profile,
        #[serde(default)]
        params: MouldParameters,
        #[serde(default)]
        resolution: Resolution,
    },
    HeapSize,
}

impl Operation {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Revolve { .. } => "revolve",
            Self::GenerateMould { .. } => "generateMould",
            Self::CalculateVolumes { .. } => "calculateVolumes",
            Self::ExportParts { .. } => "exportParts",
            Self::HeapSize => "heapSize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: Reply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Reply {
    Mesh {
        mesh: MeshData,
    },
    Parts {
        parts: BTreeMap<String, WireEntry<MeshData>>,
    },
    Volumes {
        volumes: VolumeReport,
        plaster: PlasterMix,
    },
    ExportedParts {
        parts: BTreeMap<String, WireEntry<ExportBlobs>>,
        volumes: VolumeReport,
    },
    HeapSize {
        bytes: Option<usize>,
    },
    Error(ErrorReply),
}

/// A part, or the message of the group failure it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEntry<T> {
    Part(T),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidProfile,
    InvalidParameters,
    ShellFailure,
    BooleanOperationFailure,
    KernelException,
    CriticalPart,
    /// The request itself could not be decoded.
    BadRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&MouldError> for ErrorReply {
    fn from(err: &MouldError) -> Self {
        let kind = match err {
            MouldError::InvalidProfile(_) => ErrorKind::InvalidProfile,
            MouldError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            MouldError::ShellFailure(_) => ErrorKind::ShellFailure,
            MouldError::BooleanOperationFailure(_) => ErrorKind::BooleanOperationFailure,
            MouldError::KernelException(_) => ErrorKind::KernelException,
            MouldError::CriticalPart { .. } => ErrorKind::CriticalPart,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Builds the wire part map. Failed parts of a group share one entry.
#[must_use]
pub fn parts_map<T>(parts: Vec<PartOutcome<T>>) -> BTreeMap<String, WireEntry<T>> {
    let mut map = BTreeMap::new();
    for part in parts {
        match part.result {
            Ok(value) => {
                map.insert(part.kind.wire_key(), WireEntry::Part(value));
            }
            Err(err) => {
                map.entry(format!("{}-error", err.group))
                    .or_insert(WireEntry::Error(err.message));
            }
        }
    }
    map
}

impl<K: Kernel> Engine<K> {
    /// Runs one request to completion.
    pub fn handle(&mut self, request: Request) -> Response {
        let started = Instant::now();
        let operation = request.operation.name();
        let result = match request.operation {
            Operation::Revolve { profile } => self
                .revolve(&profile)
                .map(|mesh| Reply::Mesh { mesh }),
            Operation::GenerateMould { profile, params } => self
                .generate_mould(&profile, &params)
                .map(|parts| Reply::Parts {
                    parts: parts_map(parts),
                }),
            Operation::CalculateVolumes { profile, params } => self
                .calculate_volumes(&profile, &params)
                .map(|volumes| Reply::Volumes {
                    plaster: PlasterMix::from_report(&volumes),
                    volumes,
                }),
            Operation::ExportParts {
                profile,
                params,
                resolution,
            } => self
                .export_parts(&profile, &params, resolution)
                .map(|exported| Reply::ExportedParts {
                    parts: parts_map(exported.parts),
                    volumes: exported.volumes,
                }),
            Operation::HeapSize => Ok(Reply::HeapSize {
                bytes: self.heap_size(),
            }),
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let result = match result {
            Ok(reply) => {
                tracing::info!(id = request.id, operation, elapsed_ms, "request complete");
                reply
            }
            Err(err) => {
                tracing::info!(
                    id = request.id,
                    operation,
                    elapsed_ms,
                    error = %err,
                    "request failed"
                );
                Reply::Error(ErrorReply::from(&err))
            }
        };
        Response {
            id: request.id,
            result,
        }
    }

    /// Decodes a JSON request, runs it and encodes the response.
    ///
    /// A request that cannot be decoded is answered with a `badRequest`
    /// error carrying id 0.
    ///
    /// # Errors
    ///
    /// Only if the response cannot be encoded.
    pub fn handle_json(&mut self, text: &str) -> Result<String, serde_json::Error> {
        let response = match serde_json::from_str::<Request>(text) {
            Ok(request) => self.handle(request),
            Err(err) => {
                tracing::warn!(error = %err, "undecodable request");
                Response {
                    id: 0,
                    result: Reply::Error(ErrorReply {
                        kind: ErrorKind::BadRequest,
                        message: err.to_string(),
                    }),
                }
            }
        };
        serde_json::to_string(&response)
    }
}
