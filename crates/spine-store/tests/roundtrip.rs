//! Write-then-read behavior of record streams over populated fixtures.

use std::io::Cursor;

use proptest::prelude::*;

use spine_core::{FieldValue, ObjectId};
use spine_data::{ProjectionConfig, RecoExt, RecoObject, TruthExt, TruthObject};
use spine_store::{RecordReader, RecordWriter, StoreError, VariantTag};
use spine_test_utils::{arb_reco_object, arb_truth_object, reco_list, truth_object};

fn write_reco(objects: &[RecoObject]) -> Vec<u8> {
    let mut writer = RecordWriter::<_, RecoExt>::new(Vec::new()).unwrap();
    writer.write_all(objects).unwrap();
    writer.flush().unwrap();
    writer.into_inner()
}

#[test]
fn reco_list_survives_a_file_roundtrip() {
    let list = reco_list(5);
    let objects: Vec<RecoObject> = list.iter().cloned().collect();
    let buf = write_reco(&objects);

    let reader = RecordReader::<_, RecoExt>::open(Cursor::new(buf)).unwrap();
    let back: Vec<RecoObject> = reader.objects().collect::<Result<_, _>>().unwrap();
    assert_eq!(back.len(), 5);
    for (orig, read) in objects.iter().zip(&back) {
        assert_eq!(read.id(), orig.id());
        assert_eq!(read.base().index, orig.base().index);
        assert_eq!(read.base().size().unwrap(), orig.base().size().unwrap());
        assert_eq!(
            read.base().module_ids().unwrap(),
            orig.base().module_ids().unwrap()
        );
        assert!(read.base().points.is_none());
    }
}

#[test]
fn truth_stream_keeps_matches_and_header() {
    let mut truth = truth_object(7, 3);
    truth
        .base_mut()
        .set_matches(vec![ObjectId(1)], vec![1.0])
        .unwrap();

    let mut writer = RecordWriter::<_, TruthExt>::new(Vec::new()).unwrap();
    writer.write(&truth).unwrap();
    writer.write(&truth_object(8, 1)).unwrap();
    assert_eq!(writer.records_written(), 2);
    let buf = writer.into_inner();

    let mut reader = RecordReader::<_, TruthExt>::open(buf.as_slice()).unwrap();
    assert_eq!(reader.header().variant, VariantTag::Truth);
    assert_eq!(reader.header().fields.first().map(String::as_str), Some("id"));
    assert!(!reader.header().fields.iter().any(|f| f == "points"));

    let first = reader.next_object().unwrap().unwrap();
    assert_eq!(first.id(), ObjectId(7));
    assert_eq!(first.base().match_ids(), &[ObjectId(1)]);
    assert_eq!(first.ext().size_g4().unwrap(), 6);
    let second = reader.next_object().unwrap().unwrap();
    assert_eq!(second.id(), ObjectId(8));
    assert!(reader.next_object().unwrap().is_none());
    assert_eq!(reader.records_read(), 2);
}

#[test]
fn reco_stream_is_rejected_by_truth_reader() {
    let buf = write_reco(&[]);
    let err = RecordReader::<_, TruthExt>::open(buf.as_slice())
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::VariantMismatch { .. }));
}

#[test]
fn record_iterator_stops_after_error() {
    let objects: Vec<RecoObject> = reco_list(2).iter().cloned().collect();
    let mut buf = write_reco(&objects);
    buf.truncate(buf.len() - 1);

    let reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
    let results: Vec<_> = reader.records().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(StoreError::MalformedRecord { .. })));
}

#[test]
fn narrow_bit_width_is_applied_on_write() {
    let config = ProjectionConfig {
        bit_width: 1,
        ..ProjectionConfig::default()
    };
    let objects: Vec<RecoObject> = reco_list(2).into_vec();
    let mut writer = RecordWriter::<_, RecoExt>::with_config(Vec::new(), config).unwrap();
    writer.write(&objects[0]).unwrap();
    // the second object spans modules 0 and 1
    assert!(matches!(
        writer.write(&objects[1]),
        Err(StoreError::Object(_))
    ));
}

proptest! {
    #[test]
    fn stored_records_survive_the_codec(objects in prop::collection::vec(arb_reco_object(), 0..6)) {
        let config = ProjectionConfig::default();
        let expected: Vec<_> = objects.iter().map(|o| o.project(&config).unwrap()).collect();
        let buf = write_reco(&objects);
        let reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(records, expected);
    }

    #[test]
    fn truth_objects_project_identically_after_reading(obj in arb_truth_object()) {
        let config = ProjectionConfig::default();
        let mut writer = RecordWriter::<_, TruthExt>::new(Vec::new()).unwrap();
        writer.write(&obj).unwrap();
        let buf = writer.into_inner();
        let mut reader = RecordReader::<_, TruthExt>::open(buf.as_slice()).unwrap();
        let back: TruthObject = reader.next_object().unwrap().unwrap();
        prop_assert_eq!(back.project(&config).unwrap(), obj.project(&config).unwrap());
        let back_projected = back.project(&config).unwrap();
        prop_assert_eq!(
            back_projected.get("is_truth"),
            Some(&FieldValue::Int(1))
        );
    }
}
