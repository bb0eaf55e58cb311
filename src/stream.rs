//! Byte streams for serialized engine data.

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrStream};

fn owned_stream(h: GrStream) -> NativeHandle {
    NativeHandle::owned(h.raw(), |va| Ok(raw::stream_free(GrStream::from_raw(va))?))
}

/// Growable byte sink backed by an engine stream object.
pub struct StreamOut {
    handle: NativeHandle,
}

impl StreamOut {
    pub fn new() -> Result<Self> {
        Ok(Self {
            handle: owned_stream(raw::stream_new()),
        })
    }

    fn gr(&self) -> Result<GrStream> {
        Ok(GrStream::from_raw(self.handle.va()?))
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(raw::stream_write(self.gr()?, bytes)?)
    }

    /// Append a little-endian 32-bit integer.
    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append a little-endian 32-bit float.
    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Copy of everything written so far.
    pub fn data(&self) -> Result<Vec<u8>> {
        Ok(raw::stream_data(self.gr()?)?)
    }

    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}

/// Stream that captures simulation state snapshots.
///
/// Snapshot layout: body count as a little-endian `u32`, then per body
/// its id and position, all little-endian.
pub struct StateRecorder {
    handle: NativeHandle,
}

impl StateRecorder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            handle: owned_stream(raw::stream_new()),
        })
    }

    pub(crate) fn gr(&self) -> Result<GrStream> {
        Ok(GrStream::from_raw(self.handle.va()?))
    }

    /// Copy of the recorded bytes.
    pub fn data(&self) -> Result<Vec<u8>> {
        Ok(raw::stream_data(self.gr()?)?)
    }

    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}
