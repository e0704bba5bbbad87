//! Byte-sink contract for logging front ends
//!
//! Front ends hold a sink explicitly and write through [`LogSink`], through
//! `std::io::Write`, or, for tracing, through `MakeWriter`.

use logrotor_core::Result;
use std::io;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;

use crate::plain::PlainWriter;
use crate::writer::RotatingWriter;

/// Append bytes, report how many landed; close once
pub trait LogSink: Send + Sync {
    fn append(&self, buf: &[u8]) -> Result<usize>;
    fn close(&self) -> Result<()>;
}

impl LogSink for RotatingWriter {
    fn append(&self, buf: &[u8]) -> Result<usize> {
        RotatingWriter::append(self, buf)
    }

    fn close(&self) -> Result<()> {
        RotatingWriter::close(self)
    }
}

impl LogSink for PlainWriter {
    fn append(&self, buf: &[u8]) -> Result<usize> {
        PlainWriter::append(self, buf)
    }

    fn close(&self) -> Result<()> {
        PlainWriter::close(self)
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn append(&self, buf: &[u8]) -> Result<usize> {
        (**self).append(buf)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append(&self, buf: &[u8]) -> Result<usize> {
        (**self).append(buf)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Write through a sink, following `io::Write` conventions.
///
/// `io::Write` reports an error only when nothing was written, so a
/// failure after some bytes landed is logged and returned as a short write.
pub(crate) fn write_through(sink: &dyn LogSink, buf: &[u8]) -> io::Result<usize> {
    match sink.append(buf) {
        Ok(n) => Ok(n),
        Err(e) if e.bytes_written() > 0 => {
            let written = e.bytes_written();
            warn!("Log write completed with error: {}", e);
            Ok(written)
        }
        Err(e) => Err(e.into_io()),
    }
}

/// `io::Write` adapter over any [`LogSink`]
pub struct SinkWriter<'a> {
    sink: &'a dyn LogSink,
}

impl<'a> SinkWriter<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self { sink }
    }
}

impl io::Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write_through(self.sink, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

macro_rules! impl_writer {
    ($ty:ty) => {
        impl io::Write for &$ty {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                write_through(*self, buf)
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl io::Write for $ty {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                write_through(&*self, buf)
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for $ty {
            type Writer = SinkWriter<'a>;

            fn make_writer(&'a self) -> Self::Writer {
                SinkWriter::new(self)
            }
        }
    };
}

impl_writer!(RotatingWriter);
impl_writer!(PlainWriter);
