// THEORY:
// Persistence lets a model trained on one run bootstrap the next, skipping the
// ghost-prone single-frame initialization. The file is one `SampleModel`
// serialized with bincode: the enum tag names the pixel format and the payload
// is the full (row, col, sample) array with its shape.
//
// Loading is all-or-nothing. A missing file, a truncated or foreign file, or a
// payload whose buffer length disagrees with its declared shape all fail with
// `PersistenceLoad`; the caller decides whether to fall back to synthesis.

use crate::core_modules::sample_store::SampleModel;
use crate::error::{Result, VibeError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes the full sample model to `path`, replacing any existing file.
pub fn save_samples(model: &SampleModel, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, model)?;
    writer.flush()?;
    Ok(())
}

/// Reads a sample model from `path`.
pub fn load_samples(path: &Path) -> Result<SampleModel> {
    let load_error = |reason: String| VibeError::PersistenceLoad {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| load_error(e.to_string()))?;
    let model: SampleModel =
        bincode::deserialize_from(BufReader::new(file)).map_err(|e| load_error(e.to_string()))?;
    if !model.is_consistent() {
        return Err(load_error("sample array does not match its declared shape".into()));
    }
    Ok(model)
}
