//! Record stream reader.
//!
//! [`RecordReader`] reads records of one variant from any `Read` source.
//! The header is validated on construction: the stream must hold the
//! reader's variant under the reader's stored schema.

use std::io::Read;
use std::marker::PhantomData;

use log::debug;

use spine_data::{OutObject, StoredRecord, Variant};

use crate::codec::{decode_header, decode_record};
use crate::error::StoreError;
use crate::hash::schema_hash;
use crate::types::{StoreHeader, VariantTag};

/// Reads records of variant `V` from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct RecordReader<R: Read, V: Variant> {
    reader: R,
    header: StoreHeader,
    records_read: u64,
    _variant: PhantomData<V>,
}

impl<R: Read, V: Variant> RecordReader<R, V> {
    /// Open a stream, reading and validating the header.
    pub fn open(mut reader: R) -> Result<Self, StoreError> {
        let header = decode_header(&mut reader)?;
        let expected = VariantTag::of::<V>();
        if header.variant != expected {
            return Err(StoreError::VariantMismatch {
                expected: expected.name(),
                found: header.variant.name(),
            });
        }
        let current = schema_hash(V::registry());
        if header.schema_hash != current {
            return Err(StoreError::SchemaMismatch {
                recorded: header.schema_hash,
                current,
            });
        }
        debug!(
            "opened {} record stream with {} stored fields",
            V::NAME,
            header.fields.len()
        );
        Ok(Self {
            reader,
            header,
            records_read: 0,
            _variant: PhantomData,
        })
    }

    /// The stream header.
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Read the next record, or `None` if the stream is exhausted.
    pub fn next_record(&mut self) -> Result<Option<StoredRecord>, StoreError> {
        let record = decode_record(&mut self.reader)?;
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    /// Read and restore the next object, or `None` if the stream is
    /// exhausted.
    pub fn next_object(&mut self) -> Result<Option<OutObject<V>>, StoreError> {
        match self.next_record()? {
            Some(record) => Ok(Some(OutObject::restore(&record)?)),
            None => Ok(None),
        }
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Convert into a record iterator.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self.reader,
            done: false,
        }
    }

    /// Convert into an object iterator.
    pub fn objects(self) -> ObjectIter<R, V> {
        ObjectIter {
            records: self.records(),
            _variant: PhantomData,
        }
    }
}

/// Iterator adapter over stored records.
pub struct RecordIter<R: Read> {
    reader: R,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<StoredRecord, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match decode_record(&mut self.reader) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator adapter over restored objects.
pub struct ObjectIter<R: Read, V: Variant> {
    records: RecordIter<R>,
    _variant: PhantomData<V>,
}

impl<R: Read, V: Variant> Iterator for ObjectIter<R, V> {
    type Item = Result<OutObject<V>, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.and_then(|r| OutObject::restore(&r).map_err(StoreError::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_header;
    use crate::writer::RecordWriter;
    use spine_data::{RecoExt, RecoObject, TruthExt};

    fn small_reco(id: i64) -> RecoObject {
        let mut obj = RecoObject::new();
        let base = obj.base_mut();
        base.id = spine_core::ObjectId(id);
        base.index = Some(vec![id]);
        base.depositions = Some(vec![0.5]);
        base.sources = Some(spine_core::RowArray::from_rows(&[[1i64, 0]]));
        obj
    }

    fn stream(count: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::<_, RecoExt>::new(&mut buf).unwrap();
        for id in 0..count {
            writer.write(&small_reco(id)).unwrap();
        }
        buf
    }

    #[test]
    fn roundtrip_write_read_records() {
        let buf = stream(3);
        let mut reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
        assert_eq!(reader.header().variant, VariantTag::Reco);
        for id in 0..3 {
            let obj = reader.next_object().unwrap().unwrap();
            assert_eq!(obj.id().0, id);
            assert_eq!(obj.base().module_ids().unwrap().as_slice(), &[1]);
        }
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 3);
    }

    #[test]
    fn object_iterator_works() {
        let buf = stream(4);
        let reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
        let objects: Vec<_> = reader.objects().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(objects.len(), 4);
        assert_eq!(objects[3].id().0, 3);
    }

    #[test]
    fn wrong_variant_on_open() {
        let buf = stream(1);
        assert!(matches!(
            RecordReader::<_, TruthExt>::open(buf.as_slice()),
            Err(StoreError::VariantMismatch {
                expected: "TruthObject",
                found: "RecoObject"
            })
        ));
    }

    #[test]
    fn foreign_schema_on_open() {
        let mut buf = Vec::new();
        let header = StoreHeader {
            variant: VariantTag::Reco,
            schema_hash: 1,
            fields: vec!["id".into()],
        };
        encode_header(&mut buf, &header).unwrap();
        assert!(matches!(
            RecordReader::<_, RecoExt>::open(buf.as_slice()),
            Err(StoreError::SchemaMismatch { recorded: 1, .. })
        ));
    }

    #[test]
    fn truncated_stream_errors() {
        let mut buf = stream(1);
        buf.truncate(buf.len() - 4);
        let mut reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
        assert!(reader.next_record().is_err());
    }

    #[test]
    fn bad_magic_on_open() {
        let data = b"XPNE\x01rest of data";
        let result = RecordReader::<_, RecoExt>::open(data.as_slice());
        assert!(matches!(result, Err(StoreError::InvalidMagic)));
    }
}
