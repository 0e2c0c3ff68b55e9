/// Multipart text fields of a post form that carry JSON-encoded string lists.
pub const POST_LIST_FIELDS: [&str; 4] = ["skills", "wanted_skills", "availability", "time_slots"];

/// Multipart file field for post images.
pub const POST_IMAGES_FIELD: &str = "images";

/// Multipart file field for post videos.
pub const POST_VIDEOS_FIELD: &str = "videos";
