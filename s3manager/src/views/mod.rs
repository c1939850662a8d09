//! Server-rendered HTML pages

use askama::Template;
use chrono::{DateTime, Utc};

use crate::storage::{BucketInfo, ObjectInfo};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Page listing all buckets
#[derive(Template)]
#[template(path = "buckets.html")]
pub struct BucketsPage {
    /// Buckets in display order
    pub buckets: Vec<BucketRow>,
    /// Show delete buttons
    pub allow_delete: bool,
}

/// Page listing the objects under a prefix of one bucket
#[derive(Template)]
#[template(path = "bucket.html")]
pub struct BucketPage {
    /// Bucket being browsed
    pub bucket_name: String,
    /// Objects and folders under `current_path`
    pub objects: Vec<ObjectEntry>,
    /// Show delete buttons
    pub allow_delete: bool,
    /// Breadcrumb trail for `current_path`
    pub paths: Vec<Breadcrumb>,
    /// Prefix being browsed, empty for the bucket root
    pub current_path: String,
}

/// One row of the bucket list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRow {
    /// Bucket name
    pub name: String,
    /// Formatted creation time, if known
    pub created: Option<String>,
}

impl From<BucketInfo> for BucketRow {
    fn from(bucket: BucketInfo) -> Self {
        Self {
            name: bucket.name,
            created: bucket.creation_date.as_ref().map(format_time),
        }
    }
}

/// One row of the object list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object key
    pub key: String,
    /// Key relative to the current path, without trailing `/`
    pub display_name: String,
    /// Formatted size, empty for folders
    pub size: String,
    /// Formatted last modification time, empty when unknown
    pub last_modified: String,
    /// Owner display name, empty when unknown
    pub owner: String,
    /// Storage class, empty when unknown
    pub storage_class: String,
    /// Material icon name
    pub icon: &'static str,
    /// Whether the entry opens a sub-listing
    pub is_folder: bool,
}

impl ObjectEntry {
    /// Builds the row for `object` as seen from the prefix `current_path`
    #[must_use]
    pub fn new(object: ObjectInfo, current_path: &str) -> Self {
        Self {
            display_name: display_name(&object.key, current_path),
            icon: icon(&object.key),
            size: if object.is_folder {
                String::new()
            } else {
                human_size(object.size)
            },
            last_modified: object
                .last_modified
                .as_ref()
                .map(format_time)
                .unwrap_or_default(),
            owner: object.owner.unwrap_or_default(),
            storage_class: object.storage_class.unwrap_or_default(),
            is_folder: object.is_folder,
            key: object.key,
        }
    }
}

/// A link to one level of the current path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Segment name
    pub name: String,
    /// Prefix up to and including this segment, with trailing `/`
    pub prefix: String,
}

/// Splits `path` into its non-empty segments with their cumulative prefixes
#[must_use]
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let mut prefix = String::new();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            prefix.push_str(segment);
            prefix.push('/');
            Breadcrumb {
                name: segment.to_string(),
                prefix: prefix.clone(),
            }
        })
        .collect()
}

/// Icon for a key, picked by trailing `/` or file extension
#[must_use]
pub fn icon(key: &str) -> &'static str {
    if key.ends_with('/') {
        return "folder";
    }

    let extension = key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext);

    match extension {
        Some("tgz" | "gz" | "zip") => "archive",
        Some("png" | "jpg" | "gif" | "svg") => "photo",
        Some("mp3" | "wav") => "music_note",
        _ => "insert_drive_file",
    }
}

/// Key relative to `current_path`, without trailing `/`
#[must_use]
pub fn display_name(key: &str, current_path: &str) -> String {
    let relative = key.strip_prefix(current_path).unwrap_or(key);
    relative.strip_suffix('/').unwrap_or(relative).to_string()
}

/// Formats a byte count with binary units
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}
