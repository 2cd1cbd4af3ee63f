pub mod image;
pub use image::{ImageEntry, ImageError, ImageStore, Rotation, UploadOutcome, UploadedFile};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;
