pub mod config_store;
pub mod http_client;
pub mod openai_api;
pub mod pcm;
pub mod whisper_cpp;

pub use config_store::TomlConfigStore;
pub use http_client::ReqwestClient;
pub use openai_api::OpenAiTranscriber;
pub use whisper_cpp::{WhisperCppLoader, WhisperCppModel};
