//! Lowest level crate of `rhi`. Alignment math and a hashable float wrapper used by the
//! definition types in `rhi-api`.

mod decimal;
pub use decimal::DecimalF32;

pub mod memory;
