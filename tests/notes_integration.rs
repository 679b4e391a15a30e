//! Note and onset extraction end to end
//!
//! Runs the reference analyzer over synthetic tone bursts and checks the
//! events and text output that come out of the reporters.
//!
//! Run with:
//! ```bash
//! cargo test -p stride --test notes_integration
//! ```

mod helpers;

use helpers::*;
use stride::io::MemorySource;
use stride::prelude::*;
use stride::NoteKind;

fn analyzer() -> NoteAnalyzer {
    NoteAnalyzer::new(TEST_SAMPLE_RATE, TEST_HOP, AnalyzerConfig::default()).unwrap()
}

fn scheduler<R: Report<NoteAnalyzer>>(samples: Vec<f32>, reporter: R) -> Scheduler<NoteAnalyzer, R> {
    Scheduler::builder(analyzer(), reporter)
        .hop_size(TEST_HOP)
        .frame_size(512)
        .source(MemorySource::mono(samples, TEST_SAMPLE_RATE))
        .build()
        .unwrap()
}

#[test]
fn test_tone_burst_becomes_a440_note() {
    let samples = tone_burst(440.0, 86, 172, 86);
    let emitter = NoteEmitter::new(NoteConfig::default(), TEST_HOP, TEST_SAMPLE_RATE);
    let mut scheduler = scheduler(samples, NoteReporter::with_writer(emitter, Vec::new()));

    let summary = scheduler.run().unwrap();
    assert_eq!(summary.hops, 344);
    assert_eq!(summary.drained_hops, 3);

    let (_, reporter) = scheduler.into_parts();
    let (mut emitter, out) = reporter.into_inner();
    let events = emitter.take_events();

    let ons: Vec<&NoteEvent> = events.iter().filter(|e| e.is_on()).collect();
    assert!(!ons.is_empty(), "no note-on in {:?}", events);
    let first = ons[0];
    assert!(
        (68..=70).contains(&first.note.unwrap()),
        "expected A4, got {:?}",
        first.note
    );
    assert!(first.velocity >= 1 && first.velocity <= 127);

    // The tone starts at hop 86; the note can only start after that
    assert!(first.hop >= 86);

    for off in events.iter().filter(|e| e.kind == NoteKind::Off) {
        assert_eq!(off.note, None);
        assert_eq!(off.velocity, 0);
        approx::assert_relative_eq!(
            off.time_seconds,
            off.hop as f64 * TEST_HOP as f64 / TEST_SAMPLE_RATE as f64
        );
    }

    // Every note is closed by teardown at the latest
    let last = events.last().unwrap();
    assert_eq!(last.kind, NoteKind::Off);
    assert!(last.hop <= 344);

    let text = String::from_utf8(out.unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), ons.len());
    for line in lines {
        assert_eq!(line.split('\t').count(), 3, "malformed line {:?}", line);
    }
}

#[test]
fn test_silence_yields_no_events() {
    let emitter = NoteEmitter::new(NoteConfig::default(), TEST_HOP, TEST_SAMPLE_RATE);
    let mut scheduler = scheduler(generate_silence(100 * TEST_HOP), NoteReporter::new(emitter));
    scheduler.run().unwrap();

    let (_, mut reporter) = scheduler.into_parts();
    assert!(reporter.emitter_mut().take_events().is_empty());
}

#[test]
fn test_onset_reporter_finds_tone_start() {
    let samples = tone_burst(330.0, 40, 60, 20);
    let mut scheduler = scheduler(samples, OnsetReporter::with_writer(Vec::new()));
    scheduler.run().unwrap();

    let (_, reporter) = scheduler.into_parts();
    let (onsets, out) = reporter.into_inner();
    assert!(!onsets.is_empty());

    // Within a few hops of the true start, after look-ahead correction
    let start = 40.0 * TEST_HOP as f64 / TEST_SAMPLE_RATE as f64;
    let hop_seconds = TEST_HOP as f64 / TEST_SAMPLE_RATE as f64;
    assert!(
        onsets.iter().any(|&t| (t - start).abs() <= 3.0 * hop_seconds),
        "onsets {:?} not near {}",
        onsets,
        start
    );

    let text = String::from_utf8(out.unwrap()).unwrap();
    assert_eq!(text.lines().count(), onsets.len());
}

/// 40 hops of 512 samples, each 256 zeros then 256 samples of loud sine.
fn half_tone_hops() -> Vec<f32> {
    let tone = generate_sine(440.0, TEST_SAMPLE_RATE, 40 * 256);
    let mut samples = Vec::with_capacity(40 * 512);
    for chunk in tone.chunks(256) {
        samples.extend(generate_silence(256));
        samples.extend(chunk);
    }
    samples
}

#[test]
fn test_analyzer_hop_must_match_scheduler() {
    let result = Scheduler::builder(analyzer(), ())
        .hop_size(512)
        .frame_size(512)
        .source(MemorySource::mono(half_tone_hops(), TEST_SAMPLE_RATE))
        .build();
    let err = result.err().expect("mismatched hop size must be rejected");
    assert!(matches!(err.as_core(), Some(stride::core::Error::InvalidConfig(_))));
}

#[test]
fn test_analyzer_sees_whole_hop() {
    let pipeline = PipelineConfig {
        hop_size: 512,
        frame_size: 1024,
        ..Default::default()
    };
    let analyzer =
        NoteAnalyzer::for_pipeline(TEST_SAMPLE_RATE, &pipeline, AnalyzerConfig::default()).unwrap();

    let mut silent_hops = 0;
    let mut reported = 0;
    let reporter = |analyzer: &NoteAnalyzer, hop: &HopInfo| {
        if !hop.is_draining() {
            reported += 1;
            if analyzer.hop_analysis().silent {
                silent_hops += 1;
            }
        }
    };
    let mut scheduler = Scheduler::builder(analyzer, reporter)
        .config(pipeline)
        .source(MemorySource::mono(half_tone_hops(), TEST_SAMPLE_RATE))
        .build()
        .unwrap();
    let summary = scheduler.run().unwrap();
    drop(scheduler);

    assert_eq!(summary.hops, 40);
    assert_eq!(reported, 40);
    assert_eq!(silent_hops, 0);
}
