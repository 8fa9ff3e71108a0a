mod common;

use common::{MockTransport, Op, RecordingSink};
use moticam::capture::moticam3::frame::{transfer_size, ENDPOINT};
use moticam::{
    do_capture, run, DeviceSettings, Error, OutputMode, Resolution, Session, SessionState,
};

const EXPOSURE: u16 = 0xba09;

fn low_res() -> DeviceSettings {
    DeviceSettings::new(Resolution::Low, 100.0, 1.0).unwrap()
}

fn configured(mock: &MockTransport, settings: &DeviceSettings) -> Session<MockTransport> {
    let mut session = Session::new(mock.clone());
    session.reset().unwrap();
    session.configure(settings).unwrap();
    session
}

#[test]
fn three_color_frames_end_to_end() {
    let settings = DeviceSettings::new(Resolution::Medium, 100.0, 1.0).unwrap();
    let frame_bytes = 1024 * 768;
    let mock = MockTransport::with_frames(3, frame_bytes, 0x80);
    let mut sink = RecordingSink::default();

    let summary = run(
        Session::new(mock.clone()),
        &settings,
        &mut sink,
        OutputMode::Color,
        Some(3),
    )
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.dropped, 0);
    assert!(!summary.cancelled);
    assert_eq!(sink.color.len(), 3);
    for (i, (index, width, height, data)) in sink.color.iter().enumerate() {
        assert_eq!(*index as usize, i);
        assert_eq!((*width, *height), (1024, 768));
        assert_eq!(data.len(), 1024 * 768 * 4);
        assert!(data.chunks_exact(4).all(|px| px == [0x80, 0x80, 0x80, 0xff]));
    }
    assert!(sink.raw.is_empty());

    // reset first, parked last
    let writes = mock.writes();
    assert_eq!(writes[0], (0xba00, vec![0, 0]));
    assert_eq!(writes[1], (0xba00, vec![0, 1]));
    assert_eq!(writes[writes.len() - 3..], vec![(EXPOSURE, vec![0x00, 0x0c]); 3]);
    // every write happens before the first read or after the last one
    let ops = mock.ops();
    let first_read = ops.iter().position(|op| matches!(op, Op::Read { .. })).unwrap();
    let last_read = ops.iter().rposition(|op| matches!(op, Op::Read { .. })).unwrap();
    assert!(ops[first_read..=last_read]
        .iter()
        .all(|op| matches!(op, Op::Read { .. })));
}

#[test]
fn dropped_frame_does_not_count() {
    let frame_bytes = 512 * 384;
    let mock = MockTransport::with_reads([
        Ok(frame_bytes),
        Ok(frame_bytes),
        Ok(16384),
        Ok(frame_bytes),
        Ok(frame_bytes),
        Ok(frame_bytes),
    ]);
    let mut session = configured(&mock, &low_res());
    let mut sink = RecordingSink::default();

    let summary = do_capture(&mut session, &mut sink, OutputMode::Raw, Some(5)).unwrap();

    assert_eq!(summary.frames, 5);
    assert_eq!(summary.dropped, 1);
    assert_eq!(mock.read_count(), 6);
    let indices: Vec<u32> = sink.raw.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(session.state(), SessionState::Capturing);
}

#[test]
fn reads_use_the_fixed_endpoint_and_padded_size() {
    let frame_bytes = 512 * 384;
    let mock = MockTransport::with_frames(2, frame_bytes, 0);
    let mut session = configured(&mock, &low_res());

    do_capture(&mut session, &mut RecordingSink::default(), OutputMode::Raw, Some(2)).unwrap();

    let reads: Vec<Op> = mock
        .ops()
        .into_iter()
        .filter(|op| matches!(op, Op::Read { .. }))
        .collect();
    assert_eq!(
        reads,
        vec![
            Op::Read {
                endpoint: ENDPOINT,
                requested: transfer_size(frame_bytes)
            };
            2
        ]
    );
}

#[test]
fn raw_mode_passes_bytes_through() {
    let frame_bytes = 512 * 384;
    let mock = MockTransport::with_frames(2, frame_bytes, 0x11);
    let mut session = configured(&mock, &low_res());
    let mut sink = RecordingSink::default();

    do_capture(&mut session, &mut sink, OutputMode::Raw, Some(2)).unwrap();

    assert_eq!(sink.raw.len(), 2);
    assert!(sink.color.is_empty());
    for (_, data) in &sink.raw {
        assert_eq!(data.len(), frame_bytes);
        assert!(data.iter().all(|&b| b == 0x11));
    }
}

#[test]
fn unbounded_capture_stops_when_cancelled() {
    let frame_bytes = 512 * 384;
    let mock = MockTransport::with_frames(10, frame_bytes, 0);
    let mut session = configured(&mock, &low_res());
    let mut sink = RecordingSink {
        cancel_after_polls: Some(4),
        ..RecordingSink::default()
    };

    let summary = do_capture(&mut session, &mut sink, OutputMode::Color, None).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.frames, 4);
    assert_eq!(mock.read_count(), 4);
    assert_eq!(sink.polls, 5);
}

#[test]
fn zero_count_reads_nothing() {
    let mock = MockTransport::with_frames(1, 512 * 384, 0);
    let mut session = configured(&mock, &low_res());

    let summary =
        do_capture(&mut session, &mut RecordingSink::default(), OutputMode::Raw, Some(0)).unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(mock.read_count(), 0);
}

#[test]
fn bulk_failure_aborts_and_still_parks() {
    let frame_bytes = 512 * 384;
    let mock = MockTransport::with_reads([Ok(frame_bytes), Err(rusb::Error::Io)]);
    let mut sink = RecordingSink::default();

    let err = run(
        Session::new(mock.clone()),
        &low_res(),
        &mut sink,
        OutputMode::Color,
        Some(3),
    )
    .unwrap_err();

    assert!(matches!(err, Error::BulkReadFailed(rusb::Error::Io)));
    assert_eq!(sink.color.len(), 1);
    let writes = mock.writes();
    assert_eq!(writes[writes.len() - 3..], vec![(EXPOSURE, vec![0x00, 0x0c]); 3]);
}

#[test]
fn sink_failure_is_fatal() {
    let mock = MockTransport::with_frames(3, 512 * 384, 0);
    let mut sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };

    let err = run(
        Session::new(mock.clone()),
        &low_res(),
        &mut sink,
        OutputMode::Raw,
        Some(3),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Sink(_)));
    assert_eq!(mock.read_count(), 1);
}

#[test]
fn configure_failure_skips_capture() {
    let mock = MockTransport::with_frames(3, 512 * 384, 0);
    mock.fail_writes_to(0xba01);
    let mut sink = RecordingSink::default();

    let err = run(
        Session::new(mock.clone()),
        &low_res(),
        &mut sink,
        OutputMode::Raw,
        Some(3),
    )
    .unwrap_err();

    assert!(matches!(err, Error::ControlTransferFailed { register: 0xba01, .. }));
    assert_eq!(mock.read_count(), 0);
    // the sensor was reset, so teardown still parks it
    let writes = mock.writes();
    assert_eq!(writes[writes.len() - 3..], vec![(EXPOSURE, vec![0x00, 0x0c]); 3]);
}
