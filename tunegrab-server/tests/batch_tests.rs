//! Batch orchestrator integration tests

mod helpers;

use helpers::*;
use std::io::{Cursor, Read};
use std::sync::atomic::Ordering;
use tunegrab_server::models::{AudioFormat, TrackReference};
use tunegrab_server::workflow::PipelineError;

fn three_tracks() -> Vec<TrackReference> {
    vec![
        TrackReference::new("Silence", "Delerium"),
        TrackReference::new("Innocente", "Delerium"),
        TrackReference::new("Heaven's Earth", "Delerium"),
    ]
}

#[tokio::test]
async fn test_batch_builds_stored_archive() {
    let harness = TestHarness::new();
    let state = harness.state(None);

    let archive = state.batch.run(&three_tracks(), AudioFormat::Mp3).await.unwrap();

    assert_eq!(
        archive.entries,
        vec![
            "Delerium - Silence.mp3",
            "Delerium - Innocente.mp3",
            "Delerium - Heaven's Earth.mp3",
        ]
    );

    let mut zip = zip::ZipArchive::new(Cursor::new(archive.data)).unwrap();
    assert_eq!(zip.len(), 3);
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        assert!(!data.is_empty());
    }

    assert!(temp_root_entries(harness.temp_root()).is_empty());
}

#[tokio::test]
async fn test_second_track_failure_aborts_batch() {
    let harness = TestHarness::builder()
        .transcoder(FakeTranscoder {
            fail_on_call: Some(2),
            ..Default::default()
        })
        .build();
    let state = harness.state(None);

    let err = state.batch.run(&three_tracks(), AudioFormat::Mp3).await.unwrap_err();

    match err {
        PipelineError::Batch { index, track, source } => {
            assert_eq!(index, 2);
            assert_eq!(track, "Delerium - Innocente");
            assert!(matches!(*source, PipelineError::Transcode(_)));
        }
        other => panic!("expected batch error, got {other:?}"),
    }

    // Third track never attempted; nothing left on disk
    assert_eq!(harness.transcoder.calls.load(Ordering::SeqCst), 2);
    assert!(temp_root_entries(harness.temp_root()).is_empty());
}

#[tokio::test]
async fn test_duplicate_names_get_suffix() {
    let harness = TestHarness::new();
    let state = harness.state(None);

    let tracks = vec![
        TrackReference::new("Silence", "Delerium"),
        TrackReference::new("Silence", "Delerium"),
    ];
    let archive = state.batch.run(&tracks, AudioFormat::Mp3).await.unwrap();

    assert_eq!(
        archive.entries,
        vec!["Delerium - Silence.mp3", "Delerium - Silence (1).mp3"]
    );
}

#[tokio::test]
async fn test_empty_batch_is_empty_archive() {
    let harness = TestHarness::new();
    let state = harness.state(None);

    let archive = state.batch.run(&[], AudioFormat::Flac).await.unwrap();

    assert!(archive.entries.is_empty());
    let zip = zip::ZipArchive::new(Cursor::new(archive.data)).unwrap();
    assert_eq!(zip.len(), 0);
}
