pub mod client;
pub mod decode;
pub mod error;
pub mod frame;

pub use client::{connect, event_stream, EventStream};
pub use decode::decode_frame;
pub use error::StreamError;
pub use frame::{FrameBuffer, SseFrame};
