//! Full write-then-rescan cycles through real segment bytes.
//!
//! Every test here re-opens the written bytes with a fresh scan, so the
//! read path exercises exactly what the write path produced.

use tdms_core::{
    CoreResult, IterSource, TdmsReader, TdmsWriter, TdsType, Timestamp, Value, VecRowSource,
};
use tdms_storage::{FileBackend, InMemoryBackend, StorageBackend};

/// Writes one channel of values and re-opens the bytes with a fresh scan.
fn write_and_rescan(values: Vec<Value>) -> TdmsReader<InMemoryBackend> {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(values)
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    TdmsReader::open(InMemoryBackend::with_data(data)).unwrap()
}

fn collect(reader: &TdmsReader<InMemoryBackend>) -> Vec<Value> {
    reader
        .channel_values("g", "c")
        .unwrap()
        .collect::<CoreResult<_>>()
        .unwrap()
}

#[test]
fn i32_extremes() {
    let values = vec![
        Value::I32(i32::MIN),
        Value::I32(-1_073_741_824),
        Value::I32(0),
        Value::I32(1_073_741_823),
        Value::I32(i32::MAX),
    ];
    let reader = write_and_rescan(values.clone());
    assert_eq!(reader.channel_len("g", "c").unwrap(), 5);
    assert_eq!(
        reader
            .file()
            .find_group("g")
            .unwrap()
            .find_channel("c")
            .unwrap()
            .data_type(),
        Some(TdsType::I32)
    );
    assert_eq!(collect(&reader), values);
}

#[test]
fn integer_type_extremes() {
    let cases: Vec<Vec<Value>> = vec![
        vec![Value::I8(i8::MIN), Value::I8(0), Value::I8(i8::MAX)],
        vec![Value::I16(i16::MIN), Value::I16(i16::MAX)],
        vec![Value::I64(i64::MIN), Value::I64(i64::MAX)],
        vec![Value::U8(0), Value::U8(u8::MAX)],
        vec![Value::U16(0), Value::U16(u16::MAX)],
        vec![Value::U32(0), Value::U32(u32::MAX)],
        vec![Value::U64(0), Value::U64(u64::MAX)],
    ];
    for values in cases {
        let reader = write_and_rescan(values.clone());
        assert_eq!(collect(&reader), values);
    }
}

#[test]
fn floats_and_bools() {
    let floats = vec![
        Value::F64(0.0),
        Value::F64(-0.0),
        Value::F64(f64::MIN_POSITIVE),
        Value::F64(f64::MAX),
        Value::F64(f64::NEG_INFINITY),
    ];
    assert_eq!(collect(&write_and_rescan(floats.clone())), floats);

    let singles = vec![Value::F32(1.5), Value::F32(-2.25)];
    assert_eq!(collect(&write_and_rescan(singles.clone())), singles);

    let bools = vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)];
    assert_eq!(collect(&write_and_rescan(bools.clone())), bools);
}

#[test]
fn timestamps() {
    // 2008-06-07T01:23:45Z
    let ts = Timestamp::from_unix_seconds(1_212_801_825);
    let with_fraction = Timestamp::new(ts.seconds, u64::MAX / 2);
    let values = vec![Value::Timestamp(ts), Value::Timestamp(with_fraction)];

    let reader = write_and_rescan(values.clone());
    assert_eq!(collect(&reader), values);

    let read_back = reader.value("g", "c", 0).unwrap();
    let read_ts = read_back.as_timestamp().unwrap();
    assert_eq!(read_ts.to_unix_seconds(), 1_212_801_825);
}

#[test]
fn channel_lengths_zero_one_five() {
    for n in [0usize, 1, 5] {
        let values: Vec<Value> = (0..n as i32).map(Value::I32).collect();
        let mut writer = TdmsWriter::new(InMemoryBackend::new());
        let channel = writer.file_mut().group("g").channel("c");
        channel.set_data_type(TdsType::I32).unwrap();
        channel.append_values(values.clone()).unwrap();
        writer.write().unwrap();

        let data = writer.into_backend().data();
        let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
        assert_eq!(reader.channel_len("g", "c").unwrap(), n as u64);
        assert_eq!(collect(&reader), values);
    }
}

#[test]
fn multi_segment_concatenation() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(1), Value::I32(2)])
        .unwrap();
    writer.write().unwrap();

    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(3)])
        .unwrap();
    writer.write().unwrap();

    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(4), Value::I32(5)])
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(reader.channel_len("g", "c").unwrap(), 5);
    assert_eq!(
        collect(&reader),
        (1..=5).map(Value::I32).collect::<Vec<_>>()
    );
}

#[test]
fn write_is_idempotent() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(7)])
        .unwrap();
    assert!(writer.write().unwrap() > 0);

    let size_after_first = writer.file().groups().len();
    assert_eq!(writer.write().unwrap(), 0);
    assert_eq!(writer.file().groups().len(), size_after_first);
}

#[test]
fn properties_survive_a_rescan() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    let file = writer.file_mut();
    file.set_property("title", "test run");
    file.set_property("revision", 3u32);
    let group = file.group("g");
    group.set_property("rate", 10_000.0f64);
    let channel = group.channel("c");
    channel.set_property("unit", "V");
    channel.append_values(vec![Value::F64(1.0)]).unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    let file = reader.file();
    assert_eq!(
        file.properties().get("title"),
        Some(&Value::String("test run".to_string()))
    );
    assert_eq!(file.properties().get("revision"), Some(&Value::U32(3)));
    assert_eq!(
        file.find_group("g").unwrap().properties().get("rate"),
        Some(&Value::F64(10_000.0))
    );
    assert_eq!(
        file.find_group("g")
            .unwrap()
            .find_channel("c")
            .unwrap()
            .properties()
            .get("unit"),
        Some(&Value::String("V".to_string()))
    );
}

#[test]
fn string_channel_short_long_short() {
    let long = "x".repeat(10_000);
    let values = vec![
        Value::String("short".to_string()),
        Value::String(String::new()),
        Value::String(long.clone()),
        Value::String("end".to_string()),
    ];
    let reader = write_and_rescan(values.clone());
    assert_eq!(collect(&reader), values);
    // Random access straight into the middle of the blob
    assert_eq!(reader.value("g", "c", 2).unwrap(), Value::String(long));
    assert_eq!(
        reader.value("g", "c", 1).unwrap(),
        Value::String(String::new())
    );
}

#[test]
fn string_channel_across_segments() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::String("one".to_string())])
        .unwrap();
    writer.write().unwrap();
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::String("two".to_string())])
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(
        collect(&reader),
        vec![
            Value::String("one".to_string()),
            Value::String("two".to_string())
        ]
    );
}

#[test]
fn interleaved_two_channels() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    let group = writer.file_mut().group("g");
    group.channel("counts").set_data_type(TdsType::I16).unwrap();
    group.channel("levels").set_data_type(TdsType::F64).unwrap();
    group
        .attach_interleaved(
            &["counts", "levels"],
            Box::new(VecRowSource::new(vec![
                vec![Value::I16(1), Value::F64(0.25)],
                vec![Value::I16(2), Value::F64(0.5)],
                vec![Value::I16(3), Value::F64(0.75)],
            ])),
        )
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(reader.channel_len("g", "counts").unwrap(), 3);
    assert_eq!(reader.channel_len("g", "levels").unwrap(), 3);
    assert_eq!(reader.value("g", "counts", 2).unwrap(), Value::I16(3));
    assert_eq!(reader.value("g", "levels", 0).unwrap(), Value::F64(0.25));
    assert_eq!(reader.value("g", "levels", 1).unwrap(), Value::F64(0.5));
}

#[test]
fn streaming_source_spans_many_chunks() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    let channel = writer.file_mut().group("g").channel("c");
    channel.set_data_type(TdsType::U64).unwrap();
    channel
        .append_source(Box::new(IterSource::new((0u64..20_000).map(Value::U64))))
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(reader.channel_len("g", "c").unwrap(), 20_000);
    assert_eq!(reader.value("g", "c", 0).unwrap(), Value::U64(0));
    assert_eq!(reader.value("g", "c", 19_999).unwrap(), Value::U64(19_999));
}

#[test]
fn reopen_and_append_through_a_reader() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(1)])
        .unwrap();
    writer.write().unwrap();

    // Scan the bytes, then keep appending through the scanned model
    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    let mut writer = reader.into_writer();
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(2)])
        .unwrap();
    writer.write().unwrap();

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(collect(&reader), vec![Value::I32(1), Value::I32(2)]);
}

#[test]
fn multiple_channels_in_one_segment() {
    let mut writer = TdmsWriter::new(InMemoryBackend::new());
    let group = writer.file_mut().group("g");
    group
        .channel("a")
        .append_values(vec![Value::I32(1), Value::I32(2)])
        .unwrap();
    group
        .channel("b")
        .append_values(vec![Value::F64(0.5)])
        .unwrap();
    // Both channels drain into a single segment
    assert_eq!(writer.write().unwrap(), 1);

    let data = writer.into_backend().data();
    let reader = TdmsReader::open(InMemoryBackend::with_data(data)).unwrap();
    assert_eq!(reader.value("g", "a", 1).unwrap(), Value::I32(2));
    assert_eq!(reader.value("g", "b", 0).unwrap(), Value::F64(0.5));
}

#[test]
fn file_backend_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.tdms");

    let backend = FileBackend::open(&path).unwrap();
    let mut writer = TdmsWriter::new(backend);
    writer
        .file_mut()
        .group("g")
        .channel("c")
        .append_values(vec![Value::I32(10), Value::I32(20)])
        .unwrap();
    writer.write().unwrap();
    writer.into_backend().sync().unwrap();

    let reader = TdmsReader::open(FileBackend::open(&path).unwrap()).unwrap();
    assert_eq!(reader.channel_len("g", "c").unwrap(), 2);
    assert_eq!(reader.value("g", "c", 1).unwrap(), Value::I32(20));
}
