use beat_slideshow_core::{
    AppConfig, RenderGraph, Session, SessionSnapshot, SessionState, TextPhase,
};

fn run_to_end(session: &mut Session, graph: &mut RenderGraph, step: f64) -> usize {
    let mut ticks = 0;
    while session.state() == SessionState::Playing {
        session.tick(step, graph);
        ticks += 1;
        assert!(ticks < 100_000, "session never finished");
    }
    ticks
}

#[test]
fn default_slideshow_finishes_after_the_last_image() {
    let config = AppConfig::default();
    let step = config.playback.frame_seconds();
    let mut session = Session::new(&config).unwrap();
    let mut graph = RenderGraph::new();

    let mut image_advances = 0;
    let mut pair_changes = 0;
    while session.state() == SessionState::Playing {
        let report = session.tick(step, &mut graph);
        image_advances += usize::from(report.image_advanced);
        pair_changes += usize::from(report.text_pair_changed);
        assert!(graph.frames() < 10_000);
    }

    // Six images of sixteen beats at 120 bpm; the text pairs finish earlier.
    assert!((session.elapsed() - 48.0).abs() < 0.05);
    assert_eq!(image_advances, 6);
    assert!(pair_changes >= 7);
    assert_eq!(session.image().current_index(), 0);
    assert!(session.text().is_cycle_complete(12));
}

#[test]
fn resuming_from_json_matches_uninterrupted_playback() {
    let config = AppConfig::default();
    let step = config.playback.frame_seconds();

    let mut reference = Session::new(&config).unwrap();
    let mut reference_graph = RenderGraph::new();

    let mut first = Session::new(&config).unwrap();
    let mut graph = RenderGraph::new();
    for _ in 0..1000 {
        first.tick(step, &mut graph);
        reference.tick(step, &mut reference_graph);
    }

    let json = first.pause().unwrap().to_json().unwrap();
    let snapshot = SessionSnapshot::from_json(&json).unwrap();

    let mut resumed = Session::new(&config).unwrap();
    resumed.restore(&snapshot).unwrap();
    assert_eq!(resumed.snapshot(), reference.snapshot());

    let resumed_ticks = run_to_end(&mut resumed, &mut graph, step);
    let reference_ticks = run_to_end(&mut reference, &mut reference_graph, step);
    assert_eq!(resumed_ticks, reference_ticks);
    assert_eq!(graph.image(), reference_graph.image());
    assert_eq!(graph.text(), reference_graph.text());
}

#[test]
fn text_overlays_accumulate_before_clearing() {
    let mut session = Session::new(&AppConfig::default()).unwrap();
    let mut graph = RenderGraph::new();

    // Half a second into the odd fade-in at 120 bpm.
    for _ in 0..25 {
        session.tick(0.1, &mut graph);
    }
    assert_eq!(session.text().phase(), TextPhase::FadeInOdd);
    let text = graph.text().unwrap();
    assert!(text.primary.visible && text.secondary.visible);
    assert_eq!(text.primary.asset, 0);
    assert_eq!(text.secondary.asset, 1);
    assert_eq!(text.primary.progress, 1.0);
    assert!(text.secondary.progress > 0.0 && text.secondary.progress < 1.0);
}
