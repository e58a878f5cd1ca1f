use qs_agenda::AgendaError;
use qs_core::CoreError;
use qs_kernel::KernelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("agenda error: {0}")]
    Agenda(#[from] AgendaError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
