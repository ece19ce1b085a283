use core_render::timing::{last_render_ns, record_last_render_ns};
use core_render::{RenderEngine, StartOptions};
use core_terminal::MemoryBackend;

#[test]
fn render_cycle_records_duration() {
    record_last_render_ns(0);
    let mut engine = RenderEngine::new(Box::new(MemoryBackend::new(80, 10)));
    engine
        .start(StartOptions {
            hide_cursor: false,
            ..StartOptions::default()
        })
        .unwrap();
    engine.update(vec!["hello", "world"].into()).unwrap();
    let snap = engine.metrics_snapshot();
    assert_eq!(snap.renders, 1);
    assert_eq!(snap.changes_written, 2);
    assert!(snap.last_render_ns > 0);
    assert!(last_render_ns() > 0);
}

#[test]
fn metrics_accumulate_across_renders() {
    let mut engine = RenderEngine::new(Box::new(MemoryBackend::new(80, 10)));
    engine
        .start(StartOptions {
            hide_cursor: false,
            ..StartOptions::default()
        })
        .unwrap();
    engine.update("a".into()).unwrap();
    engine.render().unwrap();
    engine.force_render(true).unwrap();
    let snap = engine.metrics_snapshot();
    assert_eq!(snap.renders, 3);
    assert_eq!(snap.forced_rows, 1);
    assert_eq!(snap.changes_written, 2);
}
