pub mod gateway;
pub mod imaging;
pub mod providers;
pub mod storage;

pub use gateway::ModelGateway;
pub use imaging::DecodedImage;
pub use storage::{RecordStore, StoredUpload};
