//! Built-in transforms.
//!
//! | Transform         | Row mapper | Effect                                   |
//! |-------------------|------------|------------------------------------------|
//! | [`CopyColumns`]   | yes        | copies columns under new names           |
//! | [`SelectColumns`] | yes        | keeps and reorders named columns         |
//! | [`Concat`]        | yes        | joins numeric columns into one vector    |
//! | [`StandardScale`] | yes        | z-score scales one numeric column        |
//! | [`DropMissing`]   | no         | filters out rows with missing values     |
//!
//! All of them are registered by
//! [`TransformRegistry::with_builtins`](crate::persist::TransformRegistry::with_builtins).

pub mod concat;
pub mod copy_columns;
pub mod drop_missing;
pub(crate) mod plan;
pub mod select_columns;
pub mod standard_scale;

pub use concat::Concat;
pub use copy_columns::CopyColumns;
pub use drop_missing::DropMissing;
pub use select_columns::SelectColumns;
pub use standard_scale::{StandardScale, StandardScaler, StandardScalerConfig};
