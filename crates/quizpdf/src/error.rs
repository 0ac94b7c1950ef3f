#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Could not read the document: {0}")]
    Resource(#[from] pdf::PdfError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] quizpdf_core::ConfigError),
}
