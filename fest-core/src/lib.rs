pub mod repository;
pub mod upload;
pub mod export;

pub use repository::{BookingRepository, DraftRepository, RepositoryError};
pub use upload::{AvatarUploader, MockAvatarUploader, UploadError};
pub use export::{CardExporter, ExportError};
