use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

/// Open an ONNX Runtime session on the best accelerator the platform offers.
///
/// Execution providers that fail to register fall back to CPU inside ONNX
/// Runtime, so the choice never changes results.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    log::info!("Loading ONNX model {}", model_path.display());
    let session = Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// CoreML on macOS, DirectML on Windows, plain CPU elsewhere.
fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Reads the static `(dim1, dim2, dim3)` of a 4-D model input, if declared.
pub fn input_dims(session: &Session) -> Option<[i64; 3]> {
    let input = session.inputs().first()?;
    match input.dtype() {
        ort::value::ValueType::Tensor { shape, .. } if shape.len() == 4 => {
            Some([shape[1], shape[2], shape[3]])
        }
        _ => None,
    }
}
