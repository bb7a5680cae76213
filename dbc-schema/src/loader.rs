//! Filesystem-backed spec loading: reads a directory of `*.toml` device
//! specs and ties the loader into [`crate::resolve::BaseSpecSource`].

use std::path::{
    Path,
    PathBuf,
};

use crate::{
    error::SpecError,
    raw::RawDeviceSpec,
    resolve::BaseSpecSource,
};

/// Loads device specs from a directory, one `<name>.toml` file per device.
pub struct DirectorySpecSource {
    dir: PathBuf,
}

impl DirectorySpecSource {
    /// Points the loader at `dir`. Lookups are lazy — no files are read
    /// until [`BaseSpecSource::load_base`] is called.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reads and parses the spec named `name` (without extension) from the
    /// directory this loader was created with.
    pub fn read(&self, name: &str) -> Result<RawDeviceSpec, SpecError> {
        let path = self.dir.join(format!("{name}.toml"));
        read_spec_file(&path)
    }
}

impl BaseSpecSource for DirectorySpecSource {
    fn load_base(&self, name: &str) -> Result<RawDeviceSpec, SpecError> {
        self.read(name)
    }
}

fn read_spec_file(path: &Path) -> Result<RawDeviceSpec, SpecError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&contents)?)
}
