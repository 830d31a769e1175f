use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Simulation diverged at iteration {iteration} (t = {time:.2} s)")]
    Diverged { iteration: usize, time: f64 },

    #[error("Trajectory parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
