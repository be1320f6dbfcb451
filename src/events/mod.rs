pub mod service;

pub use service::{EventRecorder, RecordError};
