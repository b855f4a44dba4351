//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! the account store, the token issuer and the media host.

pub mod account;
pub mod media;

pub use account::{AccountService, RegisterInput};
pub use media::{
    uploader_from_config, CloudinaryUploader, DisabledMediaUploader, MediaUploader, UploadedMedia,
};
