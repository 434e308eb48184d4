mod common;

use anyhow::Result;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use mediapick_core::{MediaFilter, MediaKind, PickOptions, PickerError, PickerSettings, ProcessingEvent};

#[test]
fn test_results_follow_selection_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));

    // Later entries finish first
    let entries = vec![
        entry(BytesProvider::delayed(png_bytes(10, 10), "png", Duration::from_millis(150)), "A/L0/001", &["public.png"]),
        entry(BytesProvider::delayed(png_bytes(20, 10), "png", Duration::from_millis(50)), "B/L0/001", &["public.png"]),
        entry(BytesProvider::new(png_bytes(30, 10), "png"), "C/L0/001", &["public.png"]),
    ];
    let surface = FixedSurface::new(entries);
    let options = PickOptions { selection_limit: 3, ..Default::default() };

    let results = picker.get_medias(&options, &surface)?;
    let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(results[0].id, "A/L0/001");
    assert_eq!(results[0].file.file_name, "A_L0_001.png");
    assert_eq!(results[1].width, Some(20));
    assert_eq!(results[2].file.mime_type, "image/png");
    assert_eq!(results[2].kind, MediaKind::Image);
    assert!(results[2].file.uri.starts_with("file:///"));
    assert!(results[2].file.file_size > 0);
    Ok(())
}

#[test]
fn test_failures_are_aggregated() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let entries = vec![
        entry(BytesProvider::new(png_bytes(4, 4), "png"), "ok", &["public.png"]),
        entry(BytesProvider::failing("iCloud unreachable"), "bad1", &["public.jpeg"]),
        entry(BytesProvider::failing("iCloud unreachable"), "bad2", &["public.jpeg"]),
    ];
    let surface = FixedSurface::new(entries);

    let err = picker.get_medias(&PickOptions::default(), &surface).unwrap_err();
    match &err {
        PickerError::Aggregate(messages) => assert_eq!(messages.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "Item 1 load error: iCloud unreachable\nItem 2 load error: iCloud unreachable"
    );
    Ok(())
}

#[test]
fn test_partial_keeps_successes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let entries = vec![
        entry(BytesProvider::failing("gone"), "bad", &["public.jpeg"]),
        entry(BytesProvider::new(png_bytes(4, 4), "png"), "ok", &["public.png"]),
    ];
    let surface = FixedSurface::new(entries);

    let report = picker.get_medias_partial(&PickOptions::default(), &surface)?;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].index, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].item_index(), Some(0));
    Ok(())
}

#[test]
fn test_second_pick_is_served_from_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let provider = BytesProvider::new(png_bytes(6, 6), "png");
    let surface = FixedSurface::new(vec![entry(provider.clone(), "same/id", &["public.png"])]);

    let first = picker.get_medias(&PickOptions::default(), &surface)?;
    let second = picker.get_medias(&PickOptions::default(), &surface)?;

    assert_eq!(provider.calls(), 1);
    assert_eq!(first[0].file, second[0].file);
    let cached = std::fs::read(dir.path().join("same_id.png"))?;
    assert_eq!(cached, png_bytes(6, 6));
    Ok(())
}

#[test]
fn test_heic_is_converted_to_jpeg() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let decoder = FakeHeifDecoder::new(64, 48);
    let picker = picker(dir.path(), decoder.clone());
    let provider = BytesProvider::new(heic_bytes(), "heic");
    let surface = FixedSurface::new(vec![entry(provider.clone(), "IMG/0001", &["public.heic", "public.image"])]);

    let results = picker.get_medias(&PickOptions::default(), &surface)?;
    let result = &results[0];
    assert_eq!(result.file.file_name, "IMG_0001.jpg");
    assert_eq!(result.file.mime_type, "image/jpeg");
    assert_eq!((result.width, result.height), (Some(64), Some(48)));
    assert_eq!(image::image_dimensions(dir.path().join("IMG_0001.jpg"))?, (64, 48));

    // Converted file is reused
    picker.get_medias(&PickOptions::default(), &surface)?;
    assert_eq!(provider.calls(), 1);
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_declared_heic_delivered_as_png_is_cached_as_png() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let decoder = FakeHeifDecoder::new(8, 8);
    let picker = picker(dir.path(), decoder.clone());
    let provider = BytesProvider::new(png_bytes(6, 6), "heic");
    let surface = FixedSurface::new(vec![entry(provider.clone(), "p/1", &["public.heic", "public.image"])]);

    let first = picker.get_medias(&PickOptions::default(), &surface)?;
    let second = picker.get_medias(&PickOptions::default(), &surface)?;

    for results in [&first, &second] {
        assert_eq!(results[0].file.file_name, "p_1.png");
        assert_eq!(results[0].file.mime_type, "image/png");
    }
    assert_eq!(provider.calls(), 1);
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn test_failed_conversion_does_not_fall_back_to_heic() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), BrokenHeifDecoder::new());
    let surface = FixedSurface::new(vec![entry(
        BytesProvider::new(heic_bytes(), "heic"),
        "IMG/0002",
        &["public.heic", "public.image"],
    )]);

    let err = picker.get_medias(&PickOptions::default(), &surface).unwrap_err();
    assert!(matches!(err, PickerError::Aggregate(_)));
    assert!(err.to_string().starts_with("Item 0 conversion error"), "{err}");

    let report = picker.get_medias_partial(&PickOptions::default(), &surface)?;
    assert!(report.results.iter().all(|r| !r.file.file_name.ends_with(".heic")));
    assert!(report.results.is_empty());
    assert_eq!(report.errors[0].item_index(), Some(0));
    assert!(!dir.path().join("IMG_0002.jpg").exists());
    Ok(())
}

#[test]
fn test_undeclared_heic_content_is_detected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(16, 16));
    // Declared as JPEG, delivered as HEIC
    let surface = FixedSurface::new(vec![entry(BytesProvider::new(heic_bytes(), "jpg"), "x", &["public.jpeg"])]);

    let results = picker.get_medias(&PickOptions::default(), &surface)?;
    assert_eq!(results[0].file.file_name, "x.jpg");
    assert_eq!(results[0].file.mime_type, "image/jpeg");
    assert!(dir.path().join("x.heic").exists());
    Ok(())
}

#[test]
fn test_missing_identifier_gets_uuid() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let anonymous = mediapick_core::SelectionEntry::new(
        BytesProvider::new(png_bytes(2, 2), "png"),
        vec!["public.png".to_string()],
    );
    let surface = FixedSurface::new(vec![anonymous]);

    let results = picker.get_medias(&PickOptions::default(), &surface)?;
    assert_eq!(results[0].id.len(), 36);
    assert_eq!(results[0].file.file_name, format!("{}.png", results[0].id));
    Ok(())
}

#[test]
fn test_cancelled_selection_is_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let results = picker.get_medias(&PickOptions::default(), &FixedSurface::new(Vec::new()))?;
    assert!(results.is_empty());
    Ok(())
}

#[test]
fn test_selection_truncated_to_limit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let entries = (0..5)
        .map(|i| entry(BytesProvider::new(png_bytes(2, 2), "png"), &format!("id{i}"), &["public.png"]))
        .collect();
    let surface = FixedSurface::new(entries);
    let options: PickOptions = serde_json::from_str(r#"{"selectionLimit": 2, "imageOnly": true}"#)?;

    let results = picker.get_medias(&options, &surface)?;
    assert_eq!(results.len(), 2);
    let seen = (*surface.seen.lock()).expect("surface was presented");
    assert_eq!(seen.selection_limit, 2);
    assert_eq!(seen.filter, MediaFilter::Images);
    Ok(())
}

#[test]
fn test_unsupported_surface() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let err = picker.get_medias(&PickOptions::default(), &FixedSurface::unsupported()).unwrap_err();
    assert!(matches!(err, PickerError::NotSupported(_)));
    Ok(())
}

#[test]
fn test_concurrent_pick_conflicts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let slow = FixedSurface::new(vec![entry(
        BytesProvider::delayed(png_bytes(2, 2), "png", Duration::from_millis(400)),
        "slow",
        &["public.png"],
    )]);

    std::thread::scope(|s| -> Result<()> {
        let first = s.spawn(|| picker.get_medias(&PickOptions::default(), &slow));
        // Wait until the first pick has presented
        while slow.seen.lock().is_none() {
            std::thread::sleep(Duration::from_millis(5));
        }
        let err = picker.get_medias(&PickOptions::default(), &FixedSurface::new(Vec::new())).unwrap_err();
        assert!(matches!(err, PickerError::PresentationConflict));
        assert_eq!(first.join().unwrap()?.len(), 1);
        Ok(())
    })?;

    // Released once the first pick finished
    assert!(picker.get_medias(&PickOptions::default(), &FixedSurface::new(Vec::new()))?.is_empty());
    Ok(())
}

#[test]
fn test_provider_timeout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = PickerSettings {
        provider_timeout: Some(Duration::from_millis(50)),
        ..settings(dir.path())
    };
    let picker = picker_with(settings, FakeHeifDecoder::new(8, 8));
    let surface = FixedSurface::new(vec![entry(
        BytesProvider::delayed(png_bytes(2, 2), "png", Duration::from_secs(2)),
        "stuck",
        &["public.png"],
    )]);

    let err = picker.get_medias(&PickOptions::default(), &surface).unwrap_err();
    assert!(err.to_string().starts_with("Item 0 load error: timed out"), "{err}");
    Ok(())
}

#[test]
fn test_progress_events() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut picker = picker(dir.path(), FakeHeifDecoder::new(8, 8));
    let events = picker.subscribe();
    let surface = FixedSurface::new(vec![
        entry(BytesProvider::new(png_bytes(2, 2), "png"), "e0", &["public.png"]),
        entry(BytesProvider::failing("nope"), "e1", &["public.png"]),
    ]);

    let _ = picker.get_medias(&PickOptions::default(), &surface);
    let received: Vec<ProcessingEvent> = events.try_iter().collect();
    assert_eq!(received.first(), Some(&ProcessingEvent::Begin { total: 2 }));
    assert_eq!(received.last(), Some(&ProcessingEvent::End));
    assert!(received.contains(&ProcessingEvent::ItemFinished { index: 0, ok: true }));
    assert!(received.contains(&ProcessingEvent::ItemFinished { index: 1, ok: false }));

    let quiet = PickOptions { show_loader: false, ..Default::default() };
    let _ = picker.get_medias(&quiet, &surface);
    let received: Vec<ProcessingEvent> = events.try_iter().collect();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|e| matches!(e, ProcessingEvent::ItemFinished { .. })));
    Ok(())
}
