//! Record stream writer.
//!
//! [`RecordWriter`] projects objects of one variant and streams them to
//! any `Write` sink. The header is written immediately on construction.

use std::io::Write;
use std::marker::PhantomData;

use log::debug;

use spine_data::{OutObject, ProjectionConfig, StoredRecord, Variant};

use crate::codec::{encode_header, encode_record};
use crate::error::StoreError;
use crate::hash::schema_hash;
use crate::types::{StoreHeader, VariantTag};

/// Writes records of variant `V` to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use spine_data::{RecoExt, RecoObject};
/// use spine_store::{RecordReader, RecordWriter};
///
/// let mut obj = RecoObject::new();
/// obj.base_mut().index = Some(vec![3, 4]);
/// obj.base_mut().depositions = Some(vec![1.0, 2.0]);
/// obj.base_mut().set_module_ids([0].into_iter().collect());
///
/// let mut buf = Vec::new();
/// let mut writer = RecordWriter::<_, RecoExt>::new(&mut buf).unwrap();
/// writer.write(&obj).unwrap();
/// assert_eq!(writer.records_written(), 1);
/// drop(writer);
///
/// let mut reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
/// let back = reader.next_object().unwrap().unwrap();
/// assert_eq!(back.base().size().unwrap(), 2);
/// assert_eq!(back.base().depositions_sum().unwrap(), 3.0);
/// assert!(reader.next_object().unwrap().is_none());
/// ```
pub struct RecordWriter<W: Write, V: Variant> {
    writer: W,
    config: ProjectionConfig,
    records_written: u64,
    _variant: PhantomData<V>,
}

impl<W: Write, V: Variant> RecordWriter<W, V> {
    /// Create a writer with the default projection, writing the header.
    pub fn new(writer: W) -> Result<Self, StoreError> {
        Self::with_config(writer, ProjectionConfig::default())
    }

    /// Create a writer with `config`, validating it and writing the header.
    pub fn with_config(mut writer: W, config: ProjectionConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let registry = V::registry();
        let header = StoreHeader {
            variant: VariantTag::of::<V>(),
            schema_hash: schema_hash(registry),
            fields: registry.stored_fields().map(|d| d.name.to_string()).collect(),
        };
        encode_header(&mut writer, &header)?;
        debug!(
            "opened {} record stream: {} stored fields, schema {:#018x}",
            V::NAME,
            header.fields.len(),
            header.schema_hash
        );
        Ok(Self {
            writer,
            config,
            records_written: 0,
            _variant: PhantomData,
        })
    }

    /// Project `object` and write it.
    pub fn write(&mut self, object: &OutObject<V>) -> Result<(), StoreError> {
        let record = object.project(&self.config)?;
        self.write_record(&record)
    }

    /// Project and write every object, stopping at the first failure.
    pub fn write_all<'a>(
        &mut self,
        objects: impl IntoIterator<Item = &'a OutObject<V>>,
    ) -> Result<(), StoreError> {
        for object in objects {
            self.write(object)?;
        }
        Ok(())
    }

    /// Write an already projected record.
    pub fn write_record(&mut self, record: &StoredRecord) -> Result<(), StoreError> {
        encode_record(&mut self.writer, record)?;
        self.records_written += 1;
        Ok(())
    }

    /// Projection settings in use.
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_data::{ConfigError, RecoExt, RecoObject};

    #[test]
    fn invalid_config_is_rejected_before_writing() {
        let mut buf = Vec::new();
        let config = ProjectionConfig {
            bit_width: 0,
            ..ProjectionConfig::default()
        };
        let err = RecordWriter::<_, RecoExt>::with_config(&mut buf, config)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StoreError::Config(ConfigError::InvalidBitWidth { value: 0 })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn failed_projection_writes_nothing() {
        let mut writer = RecordWriter::<_, RecoExt>::new(Vec::new()).unwrap();
        let header_len = writer.writer.len();
        let unprojectable = RecoObject::new();
        assert!(matches!(
            writer.write(&unprojectable),
            Err(StoreError::Object(_))
        ));
        assert_eq!(writer.records_written(), 0);
        assert_eq!(writer.into_inner().len(), header_len);
    }
}
