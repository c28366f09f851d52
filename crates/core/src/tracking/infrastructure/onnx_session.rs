use std::path::Path;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
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

/// Loads a model on the platform's preferred execution providers.
///
/// Both hand models are small and run once or twice per frame, so a single
/// inter-op thread is enough.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !model_path.exists() {
        return Err(format!("model not found: {}", model_path.display()).into());
    }
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    log::debug!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}

/// Memory layout of a model's image input.
///
/// Models converted from TFLite usually keep channels last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputLayout {
    Nchw,
    Nhwc,
}

impl InputLayout {
    /// Reads the layout from the first input's shape, defaulting to NCHW when
    /// the shape is dynamic or unreadable.
    pub fn of(session: &Session) -> Self {
        session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    Some(Self::from_shape(shape))
                } else {
                    None
                }
            })
            .unwrap_or(InputLayout::Nchw)
    }

    fn from_shape(shape: &[i64]) -> Self {
        if shape.len() == 4 && shape[3] == 3 && shape[1] != 3 {
            InputLayout::Nhwc
        } else {
            InputLayout::Nchw
        }
    }

    /// Rearranges an NCHW tensor into this layout.
    pub fn arrange(self, tensor: Array4<f32>) -> Array4<f32> {
        match self {
            InputLayout::Nchw => tensor,
            InputLayout::Nhwc => tensor
                .permuted_axes([0, 2, 3, 1])
                .as_standard_layout()
                .into_owned(),
        }
    }
}
