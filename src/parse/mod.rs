pub mod codec;
pub mod timestamp;

pub use codec::{decode, decode_with_report, encode, CodecError, DecodeReport};
pub use timestamp::{format_timestamp, parse_timestamp};
