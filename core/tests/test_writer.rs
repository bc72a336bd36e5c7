#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use tarzst_core::{
        compression::{ClassPolicy, CompressionProfile, ProfileTable, SegmentClass},
        config::WriterConfig,
        stream::{ArchiveCallbacks, FlushReason, OutputSink, SplitWriter, WriterState},
        types::{StreamError, UsageError},
    };

    // --- Helpers ---

    fn split_frames(mut data: &[u8]) -> Vec<&[u8]> {
        let mut frames = Vec::new();
        while !data.is_empty() {
            let n = zstd_safe::find_frame_compressed_size(data).expect("valid zstd frame");
            frames.push(&data[..n]);
            data = &data[n..];
        }
        frames
    }

    fn decode(frame: &[u8]) -> Vec<u8> {
        zstd::decode_all(frame).expect("frame decodes")
    }

    fn memory_writer(capacity: usize) -> SplitWriter {
        let config = WriterConfig::new(capacity).with_frame_log(true);
        SplitWriter::new(OutputSink::Memory, config).unwrap()
    }

    /// Writer that appends into a shared vector, so tests can inspect it after drop.
    #[derive(Clone, Default)]
    struct SharedVec(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedVec {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Accepts `budget` bytes, then refuses everything.
    struct FailAfter {
        budget: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // --- Reference scenario ---

    #[test]
    fn two_entries_yield_four_alternating_frames() {
        let header_a = [0xA1u8; 9];
        let header_b = [0xB2u8; 9];

        let mut w = memory_writer(1024);
        w.open().unwrap();

        w.declare_change().unwrap();
        w.ingest(&header_a).unwrap();
        w.declare_change().unwrap();
        w.ingest(b"abcdefghij").unwrap();
        w.declare_change().unwrap();
        w.ingest(&header_b).unwrap();
        w.declare_change().unwrap();
        w.ingest(b"klmnopqrst").unwrap();

        let snapshot = w.finish().unwrap();
        let output = snapshot.output.clone().unwrap();

        let frames = split_frames(&output);
        assert_eq!(frames.len(), 4);
        assert_eq!(decode(frames[0]), header_a);
        assert_eq!(decode(frames[1]), b"abcdefghij");
        assert_eq!(decode(frames[2]), header_b);
        assert_eq!(decode(frames[3]), b"klmnopqrst");

        let classes: Vec<_> = snapshot.frames.iter().map(|f| f.class).collect();
        assert_eq!(
            classes,
            vec![SegmentClass::Header, SegmentClass::Content, SegmentClass::Header, SegmentClass::Content]
        );
        let segments: Vec<_> = snapshot.frames.iter().map(|f| f.segment).collect();
        assert_eq!(segments, vec![1, 2, 3, 4]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&header_a);
        expected.extend_from_slice(b"abcdefghij");
        expected.extend_from_slice(&header_b);
        expected.extend_from_slice(b"klmnopqrst");
        assert_eq!(expected.len(), 38);
        assert_eq!(decode(&output), expected);

        assert_eq!(snapshot.frames_header, 2);
        assert_eq!(snapshot.frames_content, 2);
        assert_eq!(snapshot.flushes_boundary, 4);
        assert_eq!(snapshot.flushes_close, 1);
        assert_eq!(snapshot.flushes_empty, 1, "first boundary finds an empty buffer");
        assert_eq!(snapshot.context_resets, 6);
        assert_eq!(snapshot.bytes_compressed, output.len() as u64);
        assert!(snapshot.sanity_check());
    }

    #[test]
    fn even_is_header_policy_flips_frame_classes() {
        let config = WriterConfig::new(1024)
            .with_class_policy(ClassPolicy::EvenIsHeader)
            .with_frame_log(true);
        let mut w = SplitWriter::new(OutputSink::Memory, config).unwrap();
        w.open().unwrap();
        assert_eq!(w.active_class(), Some(SegmentClass::Header));

        w.ingest(b"segment zero").unwrap();
        w.declare_change().unwrap();
        w.ingest(b"segment one").unwrap();

        let snapshot = w.finish().unwrap();
        let classes: Vec<_> = snapshot.frames.iter().map(|f| f.class).collect();
        assert_eq!(classes, vec![SegmentClass::Header, SegmentClass::Content]);
    }

    #[test]
    fn every_frame_uses_the_profile_of_its_segment() {
        let mut w = memory_writer(32);
        w.open().unwrap();
        for round in 0..6u8 {
            w.declare_change().unwrap();
            w.ingest(&[round; 20]).unwrap();
            w.ingest(&[round; 20]).unwrap(); // forces a within-segment split
        }
        let snapshot = w.finish().unwrap();

        let policy = ClassPolicy::default();
        for frame in &snapshot.frames {
            assert_eq!(frame.class, policy.class_of(frame.segment));
        }
        // Frames never go back to an earlier segment.
        assert!(snapshot.frames.windows(2).all(|p| p[0].segment <= p[1].segment));
        assert_eq!(snapshot.frames.len(), 12);
    }

    #[test]
    fn emitted_frames_carry_their_class_profile_on_the_wire() {
        // Only the header profile sets the content checksum flag.
        let profiles = ProfileTable {
            header: CompressionProfile { checksum: true, ..CompressionProfile::header() },
            content: CompressionProfile { checksum: false, ..CompressionProfile::content() },
        };
        let config = WriterConfig::new(1024).with_profiles(profiles);
        let mut w = SplitWriter::new(OutputSink::Memory, config).unwrap();
        w.open().unwrap();

        for (header, body) in [(&[0xA1u8; 9], &b"abcdefghij"[..]), (&[0xB2u8; 9], &b"klmnopqrst"[..])] {
            w.declare_change().unwrap();
            w.ingest(header).unwrap();
            w.declare_change().unwrap();
            w.ingest(body).unwrap();
        }
        let output = w.finish().unwrap().output.unwrap();

        let frames = split_frames(&output);
        assert_eq!(frames.len(), 4);
        // Frame_Header_Descriptor follows the 4-byte magic; bit 2 is Content_Checksum_flag.
        let checksummed: Vec<bool> = frames.iter().map(|f| f[4] & 0x04 != 0).collect();
        assert_eq!(checksummed, vec![true, false, true, false]);
        assert_eq!(decode(frames[0]), [0xA1u8; 9]);
        assert_eq!(decode(frames[3]), b"klmnopqrst");
    }

    // --- Buffer-overflow split ---

    #[test]
    fn overflow_splits_one_segment_into_same_profile_frames() {
        let mut w = memory_writer(16);
        w.open().unwrap();
        w.ingest(b"0123456789").unwrap();
        w.ingest(b"abcdefghij").unwrap();
        w.ingest(b"ABCDEFGHIJ").unwrap();

        let snapshot = w.finish().unwrap();
        let output = snapshot.output.clone().unwrap();
        let frames = split_frames(&output);

        assert_eq!(frames.len(), 3);
        assert_eq!(decode(frames[0]), b"0123456789");
        assert_eq!(decode(frames[1]), b"abcdefghij");
        assert_eq!(decode(frames[2]), b"ABCDEFGHIJ");

        assert!(snapshot.frames.iter().all(|f| f.class == SegmentClass::Content && f.segment == 0));
        assert_eq!(snapshot.flushes_mandatory, 2);
        assert_eq!(snapshot.frames[0].reason, FlushReason::Mandatory);
        assert_eq!(snapshot.frames[2].reason, FlushReason::Close);
    }

    #[test]
    fn exact_fill_triggers_mandatory_flush() {
        let mut w = memory_writer(16);
        w.open().unwrap();
        w.ingest(&[1u8; 6]).unwrap();
        w.ingest(&[2u8; 10]).unwrap(); // 6 + 10 == capacity
        assert_eq!(w.buffered(), 10);

        let snapshot = w.finish().unwrap();
        assert_eq!(snapshot.frames.len(), 2);
        assert_eq!(snapshot.frames[0].raw_len, 6);
    }

    // --- Lazy boundaries and empty flushes ---

    #[test]
    fn declared_boundary_without_write_never_flushes() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        w.ingest(b"payload").unwrap();
        w.declare_change().unwrap();
        w.declare_change().unwrap();

        let snapshot = w.finish().unwrap();
        assert_eq!(snapshot.frames.len(), 1);
        assert_eq!(snapshot.frames[0].segment, 0);
        assert_eq!(snapshot.flushes_boundary, 0);
    }

    #[test]
    fn empty_flush_and_close_are_idempotent() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        for _ in 0..3 {
            w.flush_frame().unwrap();
        }
        w.close().unwrap();
        w.close().unwrap();
        w.flush_frame().unwrap();

        let snapshot = w.snapshot();
        assert_eq!(snapshot.output.as_ref().map(|b| b.len()), Some(0));
        assert_eq!(snapshot.frames_total(), 0);
        assert_eq!(snapshot.flushes_empty, 4);
        assert_eq!(w.state(), WriterState::Closed);
    }

    #[test]
    fn explicit_flush_closes_frame_mid_segment() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        w.ingest(b"first half ").unwrap();
        w.flush_frame().unwrap();
        w.ingest(b"second half").unwrap();

        let snapshot = w.finish().unwrap();
        let output = snapshot.output.clone().unwrap();
        assert_eq!(split_frames(&output).len(), 2);
        assert_eq!(decode(&output), b"first half second half");
        assert_eq!(snapshot.frames[0].reason, FlushReason::Explicit);
    }

    #[test]
    fn zero_length_write_still_consumes_boundary() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        w.ingest(b"content").unwrap();
        w.declare_change().unwrap();
        assert_eq!(w.ingest(&[]).unwrap(), 0);

        assert!(!w.tracker().is_pending());
        assert_eq!(w.active_class(), Some(SegmentClass::Header));
        assert_eq!(w.buffered(), 0);
        let snapshot = w.finish().unwrap();
        assert_eq!(snapshot.frames.len(), 1);
    }

    // --- Usage errors ---

    #[test]
    fn write_before_open_is_rejected() {
        let mut w = memory_writer(64);
        let err = w.ingest(b"early").unwrap_err();
        assert!(matches!(err, StreamError::Usage(UsageError::NotOpen)));
        assert_eq!(w.state(), WriterState::Idle);
    }

    #[test]
    fn second_open_is_rejected() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        assert!(matches!(w.open(), Err(StreamError::Usage(UsageError::AlreadyOpen))));
    }

    #[test]
    fn write_and_declare_after_close_are_rejected() {
        let mut w = memory_writer(64);
        w.open().unwrap();
        w.close().unwrap();

        assert!(matches!(w.ingest(b"late"), Err(StreamError::Usage(UsageError::WriteAfterClose))));
        assert_eq!(w.declare_change(), Err(UsageError::DeclareAfterClose));
    }

    #[test]
    fn oversized_write_fails_the_stream() {
        let mut w = memory_writer(16);
        w.open().unwrap();
        w.ingest(b"kept?").unwrap();

        let err = w.ingest(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Usage(UsageError::OversizedWrite { len: 16, capacity: 16 })
        ));
        assert_eq!(w.state(), WriterState::Failed);

        assert!(matches!(w.ingest(b"x"), Err(StreamError::Usage(UsageError::StreamFailed))));
        assert_eq!(w.declare_change(), Err(UsageError::StreamFailed));

        // Close still completes; buffered bytes of the failed stream are dropped.
        w.close().unwrap();
        assert_eq!(w.state(), WriterState::Closed);
        let snapshot = w.snapshot();
        assert_eq!(snapshot.output.as_ref().map(|b| b.len()), Some(0));
        assert_eq!(snapshot.bytes_ingested, 5);
        assert_eq!(snapshot.bytes_discarded, 5);
        assert_eq!(snapshot.compression_ratio, 0.0);
    }

    // --- Sink errors ---

    #[test]
    fn sink_error_on_close_is_surfaced() {
        let sink = OutputSink::Writer(Box::new(FailAfter { budget: 0 }));
        let mut w = SplitWriter::new(sink, WriterConfig::new(64)).unwrap();
        w.open().unwrap();
        w.ingest(b"will not land").unwrap();

        let err = w.close().unwrap_err();
        assert!(matches!(err, StreamError::Sink(_)));
        assert_eq!(w.state(), WriterState::Closed);
        w.close().unwrap();
    }

    #[test]
    fn sink_error_during_mandatory_flush_fails_the_stream() {
        let sink = OutputSink::Writer(Box::new(FailAfter { budget: 0 }));
        let mut w = SplitWriter::new(sink, WriterConfig::new(16)).unwrap();
        w.open().unwrap();
        w.ingest(&[9u8; 10]).unwrap();

        let err = w.ingest(&[9u8; 10]).unwrap_err();
        assert!(matches!(err, StreamError::Sink(_)));
        assert_eq!(w.state(), WriterState::Failed);
        w.close().unwrap();
    }

    // --- Sinks and adapters ---

    #[test]
    fn file_sink_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tar.zst");

        let mut w = SplitWriter::new(OutputSink::File(path.clone()), WriterConfig::new(128)).unwrap();
        w.open().unwrap();
        w.declare_change().unwrap();
        w.ingest(b"header block").unwrap();
        w.declare_change().unwrap();
        w.ingest(b"file body").unwrap();
        let snapshot = w.finish().unwrap();
        assert!(snapshot.output.is_none());

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len() as u64, snapshot.bytes_compressed);
        assert_eq!(split_frames(&written).len(), 2);
        assert_eq!(decode(&written), b"header blockfile body");
    }

    #[test]
    fn io_write_adapter_splits_large_payloads() {
        let payload: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8).collect();

        let mut w = memory_writer(32);
        w.open().unwrap();
        w.write_all(&payload).unwrap();
        w.flush().unwrap();
        assert_eq!(w.buffered(), 0);

        let snapshot = w.finish().unwrap();
        let output = snapshot.output.clone().unwrap();
        assert!(split_frames(&output).len() >= 200 / 31);
        assert!(snapshot.frames.iter().all(|f| f.raw_len < 32));
        assert_eq!(decode(&output), payload);
    }

    #[test]
    fn archive_callbacks_drive_the_writer() {
        fn drive(cb: &mut dyn ArchiveCallbacks, chunks: &[&[u8]]) -> Result<usize, StreamError> {
            cb.open()?;
            let mut total = 0;
            for chunk in chunks {
                total += cb.write(chunk)?;
            }
            cb.close()?;
            Ok(total)
        }

        let mut w = memory_writer(64);
        let total = drive(&mut w, &[b"one ", b"two ", b"three"]).unwrap();
        assert_eq!(total, 13);

        let output = w.snapshot().output.unwrap();
        assert_eq!(decode(&output), b"one two three");
    }

    #[test]
    fn drop_closes_an_open_stream() {
        let shared = SharedVec::default();
        {
            let sink = OutputSink::Writer(Box::new(shared.clone()));
            let mut w = SplitWriter::new(sink, WriterConfig::new(64)).unwrap();
            w.open().unwrap();
            w.ingest(b"flushed on drop").unwrap();
        }
        let data = shared.0.lock().unwrap().clone();
        assert_eq!(decode(&data), b"flushed on drop");
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let result = SplitWriter::new(OutputSink::Memory, WriterConfig::new(4));
        assert!(matches!(result, Err(StreamError::Config(_))));
    }
}
