use thiserror::Error;

/// Top-level error of a reporting run.
/// Every variant is fatal; the run stops at the stage that raised it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Load(#[from] crate::loader::LoadError),

    #[error("{0}")]
    Store(#[from] crate::database::store::StoreError),

    #[error("{0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),
}
