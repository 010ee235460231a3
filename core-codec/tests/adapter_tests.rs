use bridge_traits::engine::{
    DecodeEngine, DecodeEngineFactory, DecodeStatus, DecodedFormat, EncodeEngine,
    EncodeEngineFactory, EncodeParams, SampleEncoding,
};
use bridge_traits::error::EngineError;
use core_codec::{CodecError, EncoderConfig, Mp3Decoder, Mp3Encoder, DECODE_OUTPUT_ESTIMATE};
use mockall::mock;

mock! {
    EncodeEngine {}

    impl EncodeEngine for EncodeEngine {
        fn frame_size(&self) -> usize;
        fn encode_interleaved(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError>;
        fn encode_mono(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError>;
        fn flush(&mut self, out: &mut [u8]) -> Result<usize, EngineError>;
        fn frame_count(&self) -> Result<usize, EngineError>;
        fn tag_frame(&self) -> Result<Vec<u8>, EngineError>;
    }
}

mock! {
    EncodeEngineFactory {}

    impl EncodeEngineFactory for EncodeEngineFactory {
        fn create_encoder(&self, params: &EncodeParams) -> Result<Box<dyn EncodeEngine>, EngineError>;
    }
}

mock! {
    DecodeEngine {}

    impl DecodeEngine for DecodeEngine {
        fn feed(&mut self, data: &[u8]) -> Result<(), EngineError>;
        fn read(&mut self, out: &mut [u8]) -> Result<(DecodeStatus, usize), EngineError>;
        fn format(&self) -> Result<DecodedFormat, EngineError>;
    }
}

mock! {
    DecodeEngineFactory {}

    impl DecodeEngineFactory for DecodeEngineFactory {
        fn init_library(&self) -> Result<(), EngineError>;
        fn create_decoder(&self) -> Result<Box<dyn DecodeEngine>, EngineError>;
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn encode_factory(engine: MockEncodeEngine) -> MockEncodeEngineFactory {
    let mut factory = MockEncodeEngineFactory::new();
    factory
        .expect_create_encoder()
        .times(1)
        .return_once(move |_| Ok(Box::new(engine)));
    factory
}

fn encode_engine() -> MockEncodeEngine {
    let mut engine = MockEncodeEngine::new();
    engine.expect_frame_size().return_const(1152usize);
    engine
}

fn open_encoder(engine: MockEncodeEngine, config: &EncoderConfig) -> Mp3Encoder {
    Mp3Encoder::with_factory(&encode_factory(engine), config).unwrap()
}

fn decode_factory(engine: MockDecodeEngine) -> MockDecodeEngineFactory {
    let mut factory = MockDecodeEngineFactory::new();
    factory.expect_init_library().times(1).returning(|| Ok(()));
    factory
        .expect_create_decoder()
        .times(1)
        .return_once(move || Ok(Box::new(engine)));
    factory
}

fn cd_format() -> DecodedFormat {
    DecodedFormat {
        sample_rate: 44100,
        channels: 2,
        encoding: SampleEncoding::Signed16,
    }
}

// ============================================================================
// Encoder Session
// ============================================================================

#[test]
fn test_encoder_receives_normalized_params() {
    let mut factory = MockEncodeEngineFactory::new();
    factory
        .expect_create_encoder()
        .withf(|params| {
            params.sample_rate == 44100
                && params.channels == 2
                && params.bitrate == 128
                && params.quality == 2
        })
        .times(1)
        .return_once(|_| Ok(Box::new(encode_engine())));

    let config = EncoderConfig::default()
        .with_sample_rate(0)
        .with_bitrate(0)
        .with_quality(42);
    let encoder = Mp3Encoder::with_factory(&factory, &config).unwrap();
    assert_eq!(encoder.channels(), 2);
    assert_eq!(encoder.sample_rate(), 44100);
    assert_eq!(encoder.frame_length(), 1152);
    assert_eq!(encoder.frame_width(), 4);
}

#[test]
fn test_encoder_rejected_parameter() {
    let mut factory = MockEncodeEngineFactory::new();
    factory
        .expect_create_encoder()
        .return_once(|_| Err(EngineError::Rejected("dual channel".to_string())));

    let result = Mp3Encoder::with_factory(&factory, &EncoderConfig::default());
    assert!(matches!(result, Err(CodecError::InvalidConfiguration(_))));
}

#[test]
fn test_encoder_init_failure() {
    let mut factory = MockEncodeEngineFactory::new();
    factory
        .expect_create_encoder()
        .return_once(|_| Err(EngineError::Init("no handle".to_string())));

    let result = Mp3Encoder::with_factory(&factory, &EncoderConfig::default());
    assert!(matches!(result, Err(CodecError::EngineInitFailure(_))));
}

#[test]
fn test_encode_stereo_interleaved() {
    let mut engine = encode_engine();
    engine
        .expect_encode_interleaved()
        .withf(|pcm, _| pcm.to_vec() == vec![1i16, -1, 256, -256])
        .times(1)
        .returning(|_, out| {
            out[..3].copy_from_slice(b"mp3");
            Ok(3)
        });
    engine.expect_encode_mono().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let input: Vec<u8> = [1i16, -1, 256, -256]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let mut out = vec![0u8; encoder.estimate_output_bytes(input.len())];

    assert_eq!(encoder.encode(&input, &mut out).unwrap(), 3);
    assert_eq!(&out[..3], b"mp3");
}

#[test]
fn test_encode_mono_single_channel() {
    let mut engine = encode_engine();
    engine
        .expect_encode_mono()
        .withf(|pcm, _| pcm.len() == 3)
        .times(1)
        .returning(|_, _| Ok(0));
    engine.expect_encode_interleaved().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default().with_channels(1));
    assert_eq!(encoder.frame_width(), 2);

    let mut out = vec![0u8; encoder.estimate_output_bytes(6)];
    assert_eq!(encoder.encode(&[0u8; 6], &mut out).unwrap(), 0);
}

#[test]
fn test_encode_empty_input() {
    let mut engine = encode_engine();
    engine.expect_encode_interleaved().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; 16 * 1024];
    assert!(matches!(
        encoder.encode(&[], &mut out),
        Err(CodecError::EmptyInput)
    ));
}

#[test]
fn test_encode_output_too_small() {
    let mut engine = encode_engine();
    engine.expect_encode_interleaved().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let input = [0u8; 4096];
    let required = encoder.estimate_output_bytes(input.len());
    assert_eq!(required, 1281 + 7200);

    let mut out = vec![0u8; required - 1];
    match encoder.encode(&input, &mut out) {
        Err(CodecError::OutputTooSmall { required: r, provided }) => {
            assert_eq!(r, required);
            assert_eq!(provided, required - 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_encode_partial_frame_skips_engine() {
    let mut engine = encode_engine();
    engine
        .expect_encode_interleaved()
        .withf(|pcm, _| pcm.len() == 2)
        .times(1)
        .returning(|_, _| Ok(0));

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; encoder.estimate_output_bytes(4)];

    // 3 bytes never complete a 4-byte stereo frame
    assert_eq!(encoder.encode(&[1, 2, 3], &mut out).unwrap(), 0);
    // Carry plus one byte completes it
    assert_eq!(encoder.encode(&[4], &mut out).unwrap(), 0);
}

#[test]
fn test_engine_status_mapping() {
    let cases = [
        (-1, "EngineBufferTooSmall"),
        (-2, "EngineAllocationFailure"),
        (-3, "EngineNotFinalized"),
        (-4, "EngineModelFailure"),
        (-99, "EngineUnknownFailure"),
    ];

    for (code, expected) in cases {
        let mut engine = encode_engine();
        engine
            .expect_encode_interleaved()
            .returning(move |_, _| Err(EngineError::Status(code)));

        let mut encoder = open_encoder(engine, &EncoderConfig::default());
        let mut out = vec![0u8; encoder.estimate_output_bytes(4)];
        let err = encoder.encode(&[0u8; 4], &mut out).unwrap_err();

        assert!(err.is_engine_error());
        assert!(
            format!("{err:?}").starts_with(expected),
            "status {code} mapped to {err:?}"
        );
    }
}

#[test]
fn test_flush_is_idempotent() {
    let mut engine = encode_engine();
    engine.expect_flush().times(1).returning(|out| {
        out[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        Ok(4)
    });

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; encoder.estimate_output_bytes(0)];

    assert_eq!(encoder.flush(&mut out).unwrap(), 4);
    assert_eq!(encoder.flush(&mut out).unwrap(), 0);
}

#[test]
fn test_encode_after_flush_rearms_flush() {
    let mut engine = encode_engine();
    engine.expect_flush().times(2).returning(|_| Ok(1));
    engine
        .expect_encode_interleaved()
        .times(1)
        .returning(|_, _| Ok(0));

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; encoder.estimate_output_bytes(4)];

    assert_eq!(encoder.flush(&mut out).unwrap(), 1);
    encoder.encode(&[0u8; 4], &mut out).unwrap();
    assert_eq!(encoder.flush(&mut out).unwrap(), 1);
}

#[test]
fn test_flush_output_too_small() {
    let mut engine = encode_engine();
    engine.expect_flush().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; 7200];
    assert!(matches!(
        encoder.flush(&mut out),
        Err(CodecError::OutputTooSmall {
            required: 7201,
            provided: 7200
        })
    ));
}

#[test]
fn test_frame_count_delegates() {
    let mut engine = encode_engine();
    engine.expect_frame_count().returning(|| Ok(38));

    let encoder = open_encoder(engine, &EncoderConfig::default());
    assert_eq!(encoder.frame_count().unwrap(), 38);
}

#[test]
fn test_tag_frame_delegates() {
    let mut engine = encode_engine();
    engine
        .expect_tag_frame()
        .times(1)
        .returning(|| Ok(b"Info....LAME3.100".to_vec()));

    let encoder = open_encoder(engine, &EncoderConfig::default());
    assert_eq!(encoder.tag_frame().unwrap(), b"Info....LAME3.100");
}

#[test]
fn test_tag_frame_engine_failure() {
    let mut engine = encode_engine();
    engine
        .expect_tag_frame()
        .returning(|| Err(EngineError::Status(-1)));

    let encoder = open_encoder(engine, &EncoderConfig::default());
    assert!(matches!(
        encoder.tag_frame(),
        Err(CodecError::EngineBufferTooSmall)
    ));
}

#[test]
fn test_encoder_close() {
    let mut engine = encode_engine();
    engine.expect_encode_interleaved().never();

    let mut encoder = open_encoder(engine, &EncoderConfig::default());
    let mut out = vec![0u8; encoder.estimate_output_bytes(4)];
    encoder.encode(&[1, 2], &mut out).unwrap();

    encoder.close();
    assert!(encoder.is_closed());
    encoder.close();

    assert!(matches!(
        encoder.encode(&[3, 4], &mut out),
        Err(CodecError::SessionClosed)
    ));
    assert!(matches!(
        encoder.flush(&mut out),
        Err(CodecError::SessionClosed)
    ));
    assert!(matches!(
        encoder.frame_count(),
        Err(CodecError::SessionClosed)
    ));
    assert!(matches!(
        encoder.tag_frame(),
        Err(CodecError::SessionClosed)
    ));
}

// ============================================================================
// Decoder Session
// ============================================================================

#[test]
fn test_decoder_runs_library_init() {
    let mut factory = MockDecodeEngineFactory::new();
    factory
        .expect_init_library()
        .times(1)
        .returning(|| Err(EngineError::Init("library".to_string())));
    factory.expect_create_decoder().never();

    assert!(matches!(
        Mp3Decoder::with_factory(&factory),
        Err(CodecError::EngineInitFailure(_))
    ));
}

#[test]
fn test_decode_empty_input() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().never();

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert!(matches!(
        decoder.decode(&[], &mut out),
        Err(CodecError::EmptyInput)
    ));
}

#[test]
fn test_decode_output_too_small() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().never();

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    assert_eq!(decoder.estimate_output_bytes(), 184_320);

    let mut out = vec![0u8; 4096];
    assert!(matches!(
        decoder.decode(&[0xFF], &mut out),
        Err(CodecError::OutputTooSmall {
            required: 184_320,
            provided: 4096
        })
    ));
}

#[test]
fn test_decode_need_more_is_success() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().times(1).returning(|_| Ok(()));
    engine
        .expect_read()
        .times(1)
        .returning(|_| Ok((DecodeStatus::NeedMore, 0)));
    engine.expect_format().never();

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(decoder.decode(&[0xFF, 0xFB], &mut out).unwrap(), 0);
    assert!(decoder.format().is_none());
}

#[test]
fn test_zero_byte_read_ends_loop() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    engine
        .expect_read()
        .times(1)
        .returning(|_| Ok((DecodeStatus::Ok, 0)));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(decoder.decode(&[0u8; 16], &mut out).unwrap(), 0);
}

#[test]
fn test_new_format_is_retried() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    let mut calls = 0;
    engine.expect_read().times(4).returning(move |out| {
        calls += 1;
        match calls {
            1 => Ok((DecodeStatus::NewFormat, 0)),
            2 | 3 => {
                out[..100].fill(calls as u8);
                Ok((DecodeStatus::Ok, 100))
            }
            _ => Ok((DecodeStatus::NeedMore, 0)),
        }
    });
    engine.expect_format().times(1).returning(|| Ok(cd_format()));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(decoder.decode(&[0u8; 16], &mut out).unwrap(), 200);
    assert!(out[..100].iter().all(|&b| b == 2));
    assert!(out[100..200].iter().all(|&b| b == 3));

    let format = decoder.format().unwrap();
    assert_eq!(format.sample_rate, 44100);
    assert_eq!(format.channels, 2);
    assert_eq!(format.bits_per_sample, 16);
}

#[test]
fn test_format_queried_once() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    let mut produce = true;
    engine.expect_read().returning(move |_| {
        produce = !produce;
        if produce {
            Ok((DecodeStatus::NeedMore, 0))
        } else {
            Ok((DecodeStatus::Ok, 8))
        }
    });
    engine.expect_format().times(1).returning(|| Ok(cd_format()));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(decoder.decode(&[1], &mut out).unwrap(), 8);
    assert_eq!(decoder.decode(&[2], &mut out).unwrap(), 8);
}

#[test]
fn test_full_output_stops_loop() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    engine
        .expect_read()
        .times(1)
        .returning(|out| Ok((DecodeStatus::Ok, out.len())));
    engine.expect_format().returning(|| Ok(cd_format()));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(
        decoder.decode(&[1], &mut out).unwrap(),
        DECODE_OUTPUT_ESTIMATE
    );
}

#[test]
fn test_unsupported_bit_depth() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    let mut first = true;
    engine.expect_read().returning(move |_| {
        if std::mem::take(&mut first) {
            Ok((DecodeStatus::Ok, 8))
        } else {
            Ok((DecodeStatus::Done, 0))
        }
    });
    engine.expect_format().returning(|| {
        Ok(DecodedFormat {
            sample_rate: 44100,
            channels: 2,
            encoding: SampleEncoding::Float32,
        })
    });

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    let err = decoder.decode(&[1], &mut out).unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedEncoding(_)));
    assert!(err.is_container_error());
}

#[test]
fn test_decode_engine_failure_propagates() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().returning(|_| Ok(()));
    engine
        .expect_read()
        .returning(|_| Err(EngineError::Decode("bad huffman table".to_string())));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert!(matches!(
        decoder.decode(&[1], &mut out),
        Err(CodecError::EngineDecodeFailure(_))
    ));
}

#[test]
fn test_drain_reads_without_feeding() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().never();
    engine
        .expect_read()
        .times(1)
        .returning(|_| Ok((DecodeStatus::NeedMore, 0)));

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert_eq!(decoder.drain(&mut out).unwrap(), 0);
}

#[test]
fn test_decoder_close() {
    let mut engine = MockDecodeEngine::new();
    engine.expect_feed().never();

    let mut decoder = Mp3Decoder::with_factory(&decode_factory(engine)).unwrap();
    decoder.close();
    decoder.close();
    assert!(decoder.is_closed());

    let mut out = vec![0u8; DECODE_OUTPUT_ESTIMATE];
    assert!(matches!(
        decoder.decode(&[1], &mut out),
        Err(CodecError::SessionClosed)
    ));
    assert!(matches!(
        decoder.drain(&mut out),
        Err(CodecError::SessionClosed)
    ));
}
