use crate::{config::ConfigError, gateway::GatewayError};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("cms gateway error")]
    Gateway(#[from] GatewayError),

    #[error("template error")]
    Template(#[from] tera::Error),

    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(String),
}
