pub mod config;
pub mod http;
pub mod remote;
pub mod speech;

pub use config::ConfigStore;
pub use http::{FetchedBody, HttpClient};
pub use remote::{AudioUpload, RemoteTranscriber};
pub use speech::{ModelLoader, SpeechModel, TranscribeOptions};
