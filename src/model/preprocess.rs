use image::imageops::{self, FilterType};

use super::InferenceError;

/// Side length of the square grayscale input the network expects.
pub const INPUT_SIZE: u32 = 500;

/// Decodes an upload into `INPUT_SIZE * INPUT_SIZE` grayscale pixels in `[0, 1]`, row-major.
pub fn preprocess(bytes: &[u8]) -> Result<Vec<f32>, InferenceError> {
    let gray = image::load_from_memory(bytes)?.to_luma8();
    let resized = imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Nearest);
    Ok(resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect())
}
