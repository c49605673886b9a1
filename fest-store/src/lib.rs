pub mod app_config;
pub mod file_repo;
pub mod memory_repo;
pub mod uploader;
pub mod exporter;

pub use file_repo::FileBookingStore;
pub use memory_repo::MemoryBookingStore;
pub use uploader::HttpAvatarUploader;
pub use exporter::SvgFileExporter;
