use thiserror::Error;

/// Top-level error type for the faceted solid kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// A kernel routine panicked; the payload is coerced to text.
    #[error("kernel panicked: {0}")]
    Panicked(String),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to the solid arena.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to modelling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Errors raised while encoding interchange files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("too many triangles for binary STL: {0}")]
    TooManyTriangles(usize),

    #[error("face cannot be written as a planar loop: {0}")]
    NonPlanarFace(String),

    #[error("nothing to export")]
    Empty,
}

/// Convenience type alias for results using [`KernelError`].
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors surfaced by the mould generation engine.
///
/// Kernel failures are normalized into these kinds where the kernel is
/// called, so raw kernel errors never travel further up.
#[derive(Debug, Error)]
pub enum MouldError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("invalid mould parameters: {0}")]
    InvalidParameters(String),

    #[error("shell operation failed: {0}")]
    ShellFailure(#[source] KernelError),

    #[error("boolean operation failed: {0}")]
    BooleanOperationFailure(#[source] KernelError),

    #[error("kernel exception: {0}")]
    KernelException(#[source] KernelError),

    /// A part on the critical path failed; the whole request is aborted.
    #[error("the {part} could not be built; regenerate with different parameters")]
    CriticalPart {
        part: &'static str,
        #[source]
        source: Box<MouldError>,
    },
}

impl MouldError {
    /// Wraps an error as a critical-path failure of `part`.
    #[must_use]
    pub fn critical(part: &'static str, source: MouldError) -> Self {
        Self::CriticalPart {
            part,
            source: Box::new(source),
        }
    }

    /// Returns the innermost engine error, looking through critical-path wrapping.
    #[must_use]
    pub fn root(&self) -> &MouldError {
        match self {
            Self::CriticalPart { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {preset} preset: {source}")]
    Preset {
        preset: &'static str,
        #[source]
        source: TessellationError,
    },
}
