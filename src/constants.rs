//! Shared constants for editing, library layout and publishing.

pub const DEFAULT_SECTION_TITLE: &str = "Untitled Section";

/// Palette cycled through as sections are added.
pub const SECTION_COLORS: [&str; 6] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899",
];

/// Pixels per timeline page.
pub const ZOOM_DEFAULT: f64 = 30.0;
pub const ZOOM_MIN: f64 = 10.0;
pub const ZOOM_MAX: f64 = 150.0;
pub const ZOOM_IN_STEP: f64 = 10.0;
pub const ZOOM_OUT_STEP: f64 = 5.0;

pub const DEFAULT_HISTORY_LIMIT: usize = 500;

pub const DEFAULT_INPUT_ROOT: &str = "admin/input";
pub const DEFAULT_OUTPUT_ROOT: &str = "public/output";
pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";
pub const DEFAULT_STORE_ROOT: &str = "public/resources";
pub const DEFAULT_CONFIG_FILE: &str = "pdf-section-editor.json";

pub const COMPRESSED_PREFIX: &str = "compressed-";
pub const SECTIONS_DIR: &str = "sections";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const REMOTE_RESOURCES_ROOT: &str = "resources";

pub const DEFAULT_UPLOAD_DELAY_MS: u64 = 200;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_GITHUB_BRANCH: &str = "main";
