//! Loading of the DXC libraries

use std::path::{Path, PathBuf};

use hassle_rs::{Dxc, Dxil, HassleError};

use super::DxcValidator;
use crate::config::ValidatorSettings;
use crate::validator::{ValidatorError, ValidatorLoader};

/// Loader for the native DXC validator.
///
/// `dxcompiler` supplies blob creation and text conversion, `dxil` the
/// validator that signs.
#[derive(Debug, Clone)]
pub struct DxcLoader {
    dxil_path: PathBuf,
    dxcompiler_path: PathBuf,
}

impl DxcLoader {
    pub fn new(dxil_path: impl Into<PathBuf>, dxcompiler_path: impl Into<PathBuf>) -> Self {
        Self {
            dxil_path: dxil_path.into(),
            dxcompiler_path: dxcompiler_path.into(),
        }
    }

    pub fn from_settings(settings: &ValidatorSettings) -> Self {
        Self::new(&settings.dxil_path, &settings.dxcompiler_path)
    }

    pub fn dxil_path(&self) -> &Path {
        &self.dxil_path
    }

    pub fn dxcompiler_path(&self) -> &Path {
        &self.dxcompiler_path
    }
}

fn load_error(path: &Path, err: HassleError) -> ValidatorError {
    ValidatorError::LibraryLoad {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

impl ValidatorLoader for DxcLoader {
    type Validator = DxcValidator;

    fn engage(&mut self) -> Result<DxcValidator, ValidatorError> {
        let dxc = Dxc::new(Some(self.dxcompiler_path.clone()))
            .map_err(|e| load_error(&self.dxcompiler_path, e))?;
        let dxil =
            Dxil::new(Some(self.dxil_path.clone())).map_err(|e| load_error(&self.dxil_path, e))?;

        tracing::debug!(
            dxil = %self.dxil_path.display(),
            dxcompiler = %self.dxcompiler_path.display(),
            "loaded validator libraries"
        );
        DxcValidator::create(dxc, dxil)
    }

    fn disengage(&mut self, validator: DxcValidator) {
        // Interfaces release first; the libraries unload with them.
        drop(validator);
    }
}
