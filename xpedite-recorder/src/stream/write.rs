use std::io::{self, Write};

use crate::stream::{HEADER, Record};

#[derive(Debug)]
pub struct StreamWriter<W>
where
    W: io::Write,
{
    inner: io::BufWriter<W>,
    record_count: usize,
}

impl<W> StreamWriter<W>
where
    W: io::Write,
{
    /// Create a stream writer, writing the stream header immediately.
    pub fn try_new(inner: W) -> Result<Self, postcard::Error> {
        let mut buf_writer = io::BufWriter::new(inner);
        postcard::to_io(&HEADER, &mut buf_writer)?;

        Ok(Self {
            inner: buf_writer,
            record_count: 0,
        })
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), postcard::Error> {
        postcard::to_io(record, &mut self.inner)?;
        self.record_count += 1;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
