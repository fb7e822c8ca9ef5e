pub mod api;
pub mod audio;
pub mod config;
pub mod contract;
pub mod data_uri;
pub mod flow;
pub mod flows;
pub mod operation;
pub mod prompts;
pub mod provider;
pub mod studio;
pub mod youtube;

pub use config::AppConfig;
pub use contract::{Contract, ContractViolation, FieldType, Schema};
pub use data_uri::DataUri;
pub use flow::{Degraded, FailureCause, FlowError, Generation};
pub use studio::Studio;
