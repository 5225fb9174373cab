use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use super::Policy;
use crate::error::{EmsError, Result};
use crate::sim::{Action, Observation};

/// Training algorithms whose artifacts can be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sac,
    Ddpg,
}

impl Algorithm {
    pub const SUPPORTED: &'static [&'static str] = &["ddpg", "sac"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sac => "sac",
            Self::Ddpg => "ddpg",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = EmsError;

    /// Case-insensitive parse.
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Config`] naming the supported algorithms.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sac" => Ok(Self::Sac),
            "ddpg" => Ok(Self::Ddpg),
            other => Err(EmsError::config(
                "algorithm",
                format!(
                    "unsupported algorithm '{other}', supported: {}",
                    Self::SUPPORTED.join(", ")
                ),
            )),
        }
    }
}

/// A trained policy, opaque apart from inference.
pub trait PolicyArtifact {
    /// Raw action vector for `observation`; `[battery_kw]` or
    /// `[battery_kw, grid_kw]`.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, observation: &Observation, deterministic: bool) -> Result<Vec<f64>>;
}

/// Loads [`PolicyArtifact`]s from disk.
pub trait ArtifactLoader {
    /// # Errors
    ///
    /// Returns [`EmsError::Resource`] if the artifact cannot be read or the
    /// loader backend is unavailable.
    fn load(&self, algorithm: Algorithm, path: &Path) -> Result<Box<dyn PolicyArtifact>>;
}

/// Loader used when no inference backend is linked into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLoader;

impl ArtifactLoader for UnavailableLoader {
    fn load(&self, algorithm: Algorithm, path: &Path) -> Result<Box<dyn PolicyArtifact>> {
        Err(EmsError::resource(
            format!("{algorithm} loader"),
            format!(
                "no inference backend available to load {}",
                path.display()
            ),
        ))
    }
}

/// Adapter exposing a loaded artifact as a [`Policy`].
pub struct ExternalPolicy {
    /// `<algorithm>:<file name>`
    name: String,
    artifact: Box<dyn PolicyArtifact>,
    deterministic: bool,
}

impl ExternalPolicy {
    /// Resolves `algorithm` and loads the artifact at `path` through `loader`.
    ///
    /// Inference is deterministic unless changed with
    /// [`ExternalPolicy::with_deterministic`].
    ///
    /// # Errors
    ///
    /// - [`EmsError::Config`] for an unsupported algorithm name
    /// - [`EmsError::Resource`] if `path` does not exist or the loader fails
    pub fn load(algorithm: &str, path: &Path, loader: &dyn ArtifactLoader) -> Result<Self> {
        let algorithm: Algorithm = algorithm.parse()?;
        if !path.exists() {
            return Err(EmsError::resource(
                path.display().to_string(),
                "model path not found",
            ));
        }
        let artifact = loader.load(algorithm, path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        debug!(%algorithm, path = %path.display(), "external policy loaded");
        Ok(Self {
            name: format!("{algorithm}:{file_name}"),
            artifact,
            deterministic: true,
        })
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

}

impl Policy for ExternalPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, observation: &Observation) -> Result<Action> {
        let raw = self.artifact.predict(observation, self.deterministic)?;
        Action::from_slice(&raw)
    }
}
