// SPDX-License-Identifier: GPL-3.0-or-later
// src/constant.rs
//
// Application constants that should not be changed by the user.

/// Smallest crop width/height in percent of the image area.
pub const MIN_CROP_PERCENT: f32 = 5.0;

/// Upper bound of the percentage coordinate space.
pub const FULL_PERCENT: f32 = 100.0;

/// Crop rectangle a new crop session starts with (x, y, width, height).
pub const INITIAL_CROP: (f32, f32, f32, f32) = (10.0, 10.0, 80.0, 80.0);

/// Hit area of a crop handle in screen pixels.
pub const HANDLE_HIT_SIZE: f32 = 16.0;

/// Smallest brush diameter in drawing-surface pixels.
pub const MIN_BRUSH_SIZE: f32 = 5.0;

/// Largest brush diameter in drawing-surface pixels.
pub const MAX_BRUSH_SIZE: f32 = 100.0;

/// Alpha threshold above which a rescaled mask pixel counts as painted.
pub const MASK_THRESHOLD: u8 = 128;

/// Prefix of scenario keys that are still derived from their label.
pub const NEW_SCENARIO_PREFIX: &str = "new-scenario-";

/// Local storage key holding the JSON-encoded scenario list.
pub const SCENARIO_STORAGE_KEY: &str = "scenarios";

/// Directory name under the platform config/data directories.
pub const APP_DIR: &str = "photofuse";

/// Config file name inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Local storage file name inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Default hosted model endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default image model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// MIME type assumed for model output without one.
pub const DEFAULT_MIME: &str = "image/png";

/// Hex digits of the content digest used in generated file names.
pub const DIGEST_NAME_LEN: usize = 12;
