pub mod connector;
pub mod frame;
pub mod transport;

pub use connector::{Connector, FrameStream, WsConnector};
pub use frame::{decode_frame, FrameDecode};
pub use transport::StreamTransport;
