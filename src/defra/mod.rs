//! Pipeline over the DEFRA 2025 greenhouse-gas conversion-factor workbook.
//!
//! `preprocess` flattens the workbook into a tidy CSV once; `general` and
//! `categories` both read that CSV and emit activity modules from it.

use thiserror::Error;

use crate::emit::EmitError;

pub mod categories;
pub mod general;
pub mod preprocess;
pub mod tidy;

mod titles;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Tidy(#[from] tidy::TidyError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("no rows matched the {0} base-factor filter")]
    MissingBaseFactor(&'static str),
}
