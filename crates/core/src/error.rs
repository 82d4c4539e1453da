use forms_uuid::RegistryUuid;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid form version: {0}")]
    InvalidVersion(#[from] forms_types::VersionError),
    #[error("invalid text: {0}")]
    Text(#[from] forms_types::TextError),
    #[error("invalid identifier: {0}")]
    Uuid(#[from] forms_uuid::UuidError),

    #[error("form not found: {0}")]
    FormNotFound(RegistryUuid),
    #[error("encounter not found: {0}")]
    EncounterNotFound(RegistryUuid),

    #[error("failed to create directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize JSON: {0}")]
    Deserialization(serde_json::Error),
    #[error("form file storage error: {0}")]
    Files(#[from] forms_files::FilesError),
}

pub type FormResult<T> = std::result::Result<T, FormError>;
