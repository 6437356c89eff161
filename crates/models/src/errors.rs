use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<sea_orm::DbErr> for ModelError {
    fn from(e: sea_orm::DbErr) -> Self { Self::Db(e.to_string()) }
}
