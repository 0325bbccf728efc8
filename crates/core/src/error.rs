use thiserror::Error;

/// Core errors for the metrics sampler
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Source discovery error: {0}")]
    Discovery(String),

    #[error("CPU statistics error: {0}")]
    CpuStat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn discovery<S: Into<String>>(msg: S) -> Self {
        Self::Discovery(msg.into())
    }

    pub fn cpu_stat<S: Into<String>>(msg: S) -> Self {
        Self::CpuStat(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::Sink(msg.into())
    }
}
