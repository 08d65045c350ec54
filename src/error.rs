//! Error types returned by the analysis stages.

use std::{error, fmt};

/// The pipeline stage an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the image or converting it to CIELAB.
    Load,
    /// k-means clustering of the sampled chroma values.
    Clustering,
    /// Rebuilding full Lab palette colors from the clusters.
    Centroids,
    /// Applying the color vision deficiency simulation.
    Simulation,
    /// Computing the pairwise distance matrix.
    Distances,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clustering => "clustering",
            Stage::Centroids => "centroids",
            Stage::Simulation => "simulation",
            Stage::Distances => "distances",
        };
        f.write_str(name)
    }
}

/// A violated precondition on the input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// The image has no pixels.
    EmptyImage,
    /// The number of pixels does not match `width * height`.
    DimensionMismatch {
        /// `width * height`
        expected: usize,
        /// The number of pixels provided.
        actual: usize,
    },
    /// A cluster count of zero was requested.
    ZeroClusters,
    /// More clusters were requested than there are points to cluster.
    TooManyClusters {
        /// The requested cluster count.
        clusters: usize,
        /// The number of available points.
        points: usize,
    },
    /// A label refers to a cluster that does not exist.
    LabelOutOfRange {
        /// The offending label.
        label: u8,
        /// The number of clusters.
        clusters: usize,
    },
    /// The number of labels does not match the number of samples.
    LabelMismatch {
        /// The number of samples.
        samples: usize,
        /// The number of labels.
        labels: usize,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InputError::EmptyImage => write!(f, "the image has no pixels"),
            InputError::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} pixels but got {actual}")
            }
            InputError::ZeroClusters => write!(f, "the cluster count must be positive"),
            InputError::TooManyClusters { clusters, points } => {
                write!(f, "cannot make {clusters} clusters out of {points} points")
            }
            InputError::LabelOutOfRange { label, clusters } => {
                write!(f, "label {label} is out of range for {clusters} clusters")
            }
            InputError::LabelMismatch { samples, labels } => {
                write!(f, "{labels} labels were given for {samples} samples")
            }
        }
    }
}

/// An invalid analysis parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The color vision deficiency name is not recognized.
    UnknownDeficiency(String),
    /// The severity is not in `0.0..=1.0`.
    SeverityOutOfRange(f32),
    /// The collision threshold is negative or not finite.
    InvalidThreshold(f32),
    /// k-means was configured with zero attempts.
    ZeroAttempts,
    /// k-means was configured with zero iterations.
    ZeroIterations,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownDeficiency(name) => write!(
                f,
                "unknown deficiency `{name}` (expected protan, deutan or tritan)"
            ),
            ConfigError::SeverityOutOfRange(severity) => {
                write!(f, "severity {severity} is not in the range 0.0..=1.0")
            }
            ConfigError::InvalidThreshold(threshold) => {
                write!(f, "threshold {threshold} must be finite and non-negative")
            }
            ConfigError::ZeroAttempts => write!(f, "k-means needs at least one attempt"),
            ConfigError::ZeroIterations => write!(f, "k-means needs at least one iteration"),
        }
    }
}

impl error::Error for ConfigError {}

/// The error type for a failed analysis run.
#[derive(Debug)]
pub enum Error {
    /// The image file could not be opened or decoded.
    #[cfg(feature = "image")]
    Image(image::ImageError),
    /// The input data violates a precondition of the given stage.
    Input {
        /// The stage that rejected the input.
        stage: Stage,
        /// What was wrong with the input.
        kind: InputError,
    },
    /// A non-finite value reached the given stage.
    Numeric {
        /// The stage that found the value.
        stage: Stage,
        /// The index of the offending color or sample.
        index: usize,
    },
    /// An analysis parameter is invalid.
    Config(ConfigError),
}

impl Error {
    /// Creates an [`Error::Input`].
    pub(crate) const fn input(stage: Stage, kind: InputError) -> Self {
        Self::Input { stage, kind }
    }

    /// Returns the stage this error came from, if it is tied to one.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            #[cfg(feature = "image")]
            Error::Image(_) => Some(Stage::Load),
            Error::Input { stage, .. } | Error::Numeric { stage, .. } => Some(*stage),
            Error::Config(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "image")]
            Error::Image(err) => write!(f, "{}: failed to read image: {err}", Stage::Load),
            Error::Input { stage, kind } => write!(f, "{stage}: {kind}"),
            Error::Numeric { stage, index } => {
                write!(f, "{stage}: non-finite value in color {index}")
            }
            Error::Config(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            #[cfg(feature = "image")]
            Error::Image(err) => Some(err),
            Error::Config(err) => Some(err),
            Error::Input { .. } | Error::Numeric { .. } => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "image")]
impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}
