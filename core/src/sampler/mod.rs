//! Sampler types.
//!
//! [`SamplerParameters`] is what a consumer asks for, including wrap modes
//! that defer to the texture file ([`WrapMode::NoOpinion`]). [`FilterMode`],
//! [`AddressMode`] and [`CompareFunction`] describe resolved device state.

mod parameters;
mod types;

pub use parameters::{BorderColor, MagFilter, MinFilter, SamplerParameters, WrapMode};
pub use types::{AddressMode, CompareFunction, FilterMode};
