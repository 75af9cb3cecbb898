//! Wire messages for `/swarm/pingpong/1.0.0/pingpong`.
//!
//! ```protobuf
//! syntax = "proto3";
//! package pingpong;
//!
//! message Ping {
//!   string greeting = 1;
//! }
//!
//! message Pong {
//!   string response = 1;
//! }
//! ```

use quick_protobuf::{BytesReader, MessageRead, MessageWrite, Result, Writer, WriterBackend};
use quick_protobuf::sizeofs::sizeof_len;

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Ping {
    pub greeting: String,
}

impl<'a> MessageRead<'a> for Ping {
    fn from_reader(r: &mut BytesReader, bytes: &'a [u8]) -> Result<Self> {
        let mut msg = Self::default();
        while !r.is_eof() {
            match r.next_tag(bytes) {
                Ok(10) => msg.greeting = r.read_string(bytes)?.to_owned(),
                Ok(t) => {
                    r.read_unknown(bytes, t)?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(msg)
    }
}

impl MessageWrite for Ping {
    fn get_size(&self) -> usize {
        if self.greeting.is_empty() {
            0
        } else {
            1 + sizeof_len(self.greeting.len())
        }
    }

    fn write_message<W: WriterBackend>(&self, w: &mut Writer<W>) -> Result<()> {
        if !self.greeting.is_empty() {
            w.write_with_tag(10, |w| w.write_string(&self.greeting))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Pong {
    pub response: String,
}

impl<'a> MessageRead<'a> for Pong {
    fn from_reader(r: &mut BytesReader, bytes: &'a [u8]) -> Result<Self> {
        let mut msg = Self::default();
        while !r.is_eof() {
            match r.next_tag(bytes) {
                Ok(10) => msg.response = r.read_string(bytes)?.to_owned(),
                Ok(t) => {
                    r.read_unknown(bytes, t)?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(msg)
    }
}

impl MessageWrite for Pong {
    fn get_size(&self) -> usize {
        if self.response.is_empty() {
            0
        } else {
            1 + sizeof_len(self.response.len())
        }
    }

    fn write_message<W: WriterBackend>(&self, w: &mut Writer<W>) -> Result<()> {
        if !self.response.is_empty() {
            w.write_with_tag(10, |w| w.write_string(&self.response))?;
        }
        Ok(())
    }
}
