use crate::enums::ToneMap;

use image::{DynamicImage, ImageBuffer, Luma, Primitive};
use ndarray::{Array, ArrayView, Dimension, Zip};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ToneMapError {
    #[error("clamp percentile {0} is outside the valid range 0-100")]
    PercentileOutOfRange(f32),

    #[error("cannot tone map an empty array")]
    EmptyInput,

    #[error("percentile clamp value {0} leaves no dynamic range to rescale")]
    DegenerateClamp(f32),
}

/// Pixel type of a grayscale output frame.
///
/// Implemented for `u8` and `u16`, the two supported bit depths. `narrow`
/// keeps the language's native float-to-integer narrowing (saturating,
/// NaN maps to zero), which is what the disabled tone-map policy calls
/// for instead of an explicit clamp.
pub trait GrayDepth: Primitive + Send + Sync + 'static {
    const MAX_VALUE: f32;

    fn narrow(value: f32) -> Self;

    fn wrap(image: ImageBuffer<Luma<Self>, Vec<Self>>) -> DynamicImage;
}

impl GrayDepth for u8 {
    const MAX_VALUE: f32 = u8::MAX as f32;

    fn narrow(value: f32) -> Self {
        value as u8
    }

    fn wrap(image: ImageBuffer<Luma<u8>, Vec<u8>>) -> DynamicImage {
        DynamicImage::ImageLuma8(image)
    }
}

impl GrayDepth for u16 {
    const MAX_VALUE: f32 = u16::MAX as f32;

    fn narrow(value: f32) -> Self {
        value as u16
    }

    fn wrap(image: ImageBuffer<Luma<u16>, Vec<u16>>) -> DynamicImage {
        DynamicImage::ImageLuma16(image)
    }
}

/// Normalize a real-valued intensity array into the integer range of the
/// target pixel type.
///
/// With [`ToneMap::Disabled`] the values are cast directly. With
/// [`ToneMap::PercentileClamp`] the values are clamped to
/// `[0, max_clamp]`, where `max_clamp` is the `clamp_percentile`-th
/// percentile of the whole array, and rescaled so `max_clamp` maps to
/// the maximum pixel value.
///
/// `clamp_percentile` must lie in `[0, 100]` under either policy.
pub fn tone_map<P, D>(
    data: ArrayView<'_, f32, D>,
    policy: ToneMap,
    clamp_percentile: f32,
) -> Result<Array<P, D>, ToneMapError>
where
    P: GrayDepth,
    D: Dimension,
{
    if !(0.0..=100.0).contains(&clamp_percentile) {
        return Err(ToneMapError::PercentileOutOfRange(clamp_percentile));
    }
    if data.is_empty() {
        return Err(ToneMapError::EmptyInput);
    }

    match policy {
        ToneMap::Disabled => Ok(Zip::from(&data).par_map_collect(|&value| P::narrow(value))),
        ToneMap::PercentileClamp => {
            let max_clamp = percentile(&data, clamp_percentile);
            if !max_clamp.is_finite() || max_clamp <= 0.0 {
                return Err(ToneMapError::DegenerateClamp(max_clamp));
            }
            Ok(Zip::from(&data).par_map_collect(|&value| {
                P::narrow(value.clamp(0.0, max_clamp) / max_clamp * P::MAX_VALUE)
            }))
        }
    }
}

/// Percentile over all values with linear interpolation between order
/// statistics. The caller guarantees a non-empty array and a percentile
/// in `[0, 100]`.
fn percentile<D: Dimension>(data: &ArrayView<'_, f32, D>, pct: f32) -> f32 {
    let mut values: Vec<f32> = data.iter().copied().collect();
    values.par_sort_unstable_by(f32::total_cmp);

    let rank = pct / 100.0 * (values.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f32;
    values[lower] * (1.0 - weight) + values[upper] * weight
}
