pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub mod images {
    /// Longest edge allowed for stored uploads, in pixels.
    pub const MAX_DIMENSION: u32 = 1920;

    pub const UPLOAD_QUALITY: u8 = 85;

    pub const ROTATE_QUALITY: u8 = 95;
}

pub mod limits {
    pub const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;
}

pub mod session {
    pub const USER_KEY: &str = "user";

    pub const FLASH_KEY: &str = "_flashes";
}
