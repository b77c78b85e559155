use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use serde_json::json;
use signage_engine::{
    EditorConfig, Geometry, HostEvent, ImportMode, ObjectId, Paint, Primitive, RecordingHost, SceneEditor, ToastLevel,
};

fn session() -> (SceneEditor, RecordingHost) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let host = RecordingHost::new();
    let editor = SceneEditor::new(EditorConfig::default()).unwrap().with_host(host.clone());
    (editor, host)
}

fn square(editor: &mut SceneEditor, left: f64) -> ObjectId {
    editor
        .add_shape(Primitive::Rect { rx: 0.0, ry: 0.0 }, Geometry::new(left, 100.0, 80.0, 80.0), Paint::filled("#ff0000"))
        .unwrap()
}

#[test]
fn paste_with_empty_clipboard_changes_nothing() {
    let (mut editor, _) = session();
    let before = editor.scene().clone();
    assert_eq!(editor.paste().unwrap(), None);
    assert_eq!(editor.scene(), &before);
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn cut_then_paste_restores_a_fresh_copy() {
    let (mut editor, _) = session();
    let id = square(&mut editor, 100.0);
    editor.cut(id).unwrap();
    let pasted = editor.paste().unwrap().unwrap();
    assert_ne!(pasted, id);
    assert_eq!(editor.scene().get(pasted).unwrap().geometry.left, 120.0);
    assert_eq!(editor.history().labels(), ["Initial State", "Add Rectangle", "Cut", "Paste"]);
}

#[test]
fn edit_after_undo_drops_redo_branch() {
    let (mut editor, _) = session();
    let a = square(&mut editor, 0.0);
    square(&mut editor, 200.0);
    editor.undo().unwrap();
    editor.nudge(a, 5.0, 5.0).unwrap();
    assert!(!editor.can_redo());
    assert_eq!(editor.scene().len(), 1);
    assert_eq!(editor.history().labels().last().unwrap(), "Move Object");
}

#[test]
fn renderer_hears_every_change() {
    let (mut editor, host) = session();
    let id = square(&mut editor, 0.0);
    editor.toggle_visibility(id).unwrap();
    editor.undo().unwrap();
    let changes = host.events().iter().filter(|e| **e == HostEvent::SceneChanged).count();
    assert_eq!(changes, 3);
}

#[test]
fn superseded_import_never_lands() {
    let (mut editor, host) = session();
    let options = editor.import_options();
    let slow = editor.begin_import();
    let fast = editor.begin_import();
    let template = br#"<svg viewBox="0 0 1920 1080"><rect width="1920" height="1080" fill="navy"/></svg>"#;
    assert!(editor.complete_import(fast, template, &options, ImportMode::Replace).unwrap());
    assert!(!editor.complete_import(slow, b"<svg><circle r='5'/></svg>", &options, ImportMode::Replace).unwrap());
    assert_eq!(editor.scene().len(), 1);
    assert_eq!(editor.scene().objects()[0].kind_name(), "rect");
    assert!(host.toasts().is_empty());
}

#[test]
fn failed_fetch_shows_toast_only_for_current_ticket() {
    let (mut editor, host) = session();
    let ticket = editor.begin_import();
    assert!(editor.fail_import(ticket, "404"));
    assert_eq!(host.toasts(), vec![("Import failed: 404".to_string(), ToastLevel::Error)]);
    editor.begin_import();
    assert!(!editor.fail_import(ticket, "404"));
    assert_eq!(host.toasts().len(), 1);
}

#[test]
fn gzipped_template_imports() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let (mut editor, _) = session();
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(br#"<svg width="960" height="540"><circle cx="480" cy="270" r="100"/></svg>"#).unwrap();
    let bytes = gz.finish().unwrap();
    let options = editor.import_options();
    assert_eq!(editor.import_svg(&bytes, &options, ImportMode::Insert).unwrap(), 1);
    let circle = &editor.scene().objects()[0];
    let (cx, cy) = circle.world_bounds().center();
    assert!((cx - 960.0).abs() < 1e-6);
    assert!((cy - 540.0).abs() < 1e-6);
}

#[test]
fn animation_preview_restores_and_calls_back_once() {
    let (mut editor, _) = session();
    let id = square(&mut editor, 300.0);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = calls.clone();
    editor.run_animation(id, "shake", Box::new(move |id| sink.borrow_mut().push(id))).unwrap();
    assert!(editor.run_animation(id, "bounce", Box::new(|_| {})).is_err());

    let mut now = 0.0;
    while editor.is_animating(id) {
        editor.tick(now);
        now += 16.0;
        assert!(now < 5_000.0, "preview never finished");
    }
    let g = &editor.scene().get(id).unwrap().geometry;
    assert_eq!((g.left, g.top), (300.0, 100.0));
    assert_eq!(*calls.borrow(), vec![id]);
}

#[test]
fn undo_during_preview_settles_first() {
    let (mut editor, _) = session();
    let id = square(&mut editor, 300.0);
    editor.set_background("#111111").unwrap();
    let done = Rc::new(RefCell::new(false));
    let flag = done.clone();
    editor.run_animation(id, "rotate", Box::new(move |_| *flag.borrow_mut() = true)).unwrap();
    editor.tick(0.0);
    editor.tick(120.0);
    editor.undo().unwrap();
    assert!(*done.borrow());
    assert!(!editor.is_animating(id));
    assert_eq!(editor.scene().get(id).unwrap().geometry.angle, 0.0);
    assert_eq!(editor.scene().background, "#ffffff");
}

fn run_until(editor: &mut SceneEditor, from: f64, to: f64) {
    editor.tick(from);
    editor.tick(to);
}

#[test]
fn copy_during_scale_preview_pastes_the_settled_object() {
    let (mut editor, _) = session();
    let id = square(&mut editor, 100.0);
    editor.run_animation(id, "scale", Box::new(|_| {})).unwrap();
    run_until(&mut editor, 0.0, 200.0);
    assert!(editor.scene().get(id).unwrap().geometry.scale_x < 1.0);

    assert!(editor.copy(id));
    let pasted = editor.paste().unwrap().unwrap();
    let g = &editor.scene().get(pasted).unwrap().geometry;
    assert_eq!((g.scale_x, g.scale_y), (1.0, 1.0));
    let twin = editor.duplicate(id).unwrap();
    assert_eq!(editor.scene().get(twin).unwrap().geometry.scale_x, 1.0);
    assert!(editor.is_animating(id));

    let saved: serde_json::Value = serde_json::from_str(&editor.history().current().unwrap().scene).unwrap();
    for obj in saved["objects"].as_array().unwrap() {
        assert_eq!(obj["geometry"]["scaleX"], 1.0);
    }
}

#[test]
fn cut_during_fade_in_pastes_full_opacity() {
    let (mut editor, _) = session();
    let id = square(&mut editor, 100.0);
    let calls = Rc::new(RefCell::new(0));
    let count = calls.clone();
    editor.run_animation(id, "fade-in", Box::new(move |_| *count.borrow_mut() += 1)).unwrap();
    run_until(&mut editor, 0.0, 100.0);
    assert!((editor.scene().get(id).unwrap().paint.opacity - 0.2).abs() < 1e-9);

    assert!(editor.cut(id).unwrap());
    assert_eq!(*calls.borrow(), 1);
    let pasted = editor.paste().unwrap().unwrap();
    assert_eq!(editor.scene().get(pasted).unwrap().paint.opacity, 1.0);
    assert_eq!(editor.tick(10_000.0), 0);
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn style_copied_mid_preview_carries_the_real_opacity() {
    let (mut editor, _) = session();
    let source = square(&mut editor, 0.0);
    let target = square(&mut editor, 200.0);
    editor.update_object(target, &json!({"opacity": 0.25})).unwrap();
    editor.run_animation(source, "fade-in", Box::new(|_| {})).unwrap();
    run_until(&mut editor, 0.0, 250.0);

    assert!(editor.copy_style(source));
    assert!(editor.paste_style(target).unwrap());
    assert_eq!(editor.scene().get(target).unwrap().paint.opacity, 1.0);
    assert!(editor.is_animating(source));
}

#[test]
fn edits_during_a_preview_end_it_and_stick() {
    let (mut editor, _) = session();
    let shaken = square(&mut editor, 300.0);
    let bounced = square(&mut editor, 600.0);
    editor.run_animation(shaken, "shake", Box::new(|_| {})).unwrap();
    editor.run_animation(bounced, "bounce", Box::new(|_| {})).unwrap();
    run_until(&mut editor, 0.0, 130.0);

    assert!(editor.nudge(shaken, 10.0, 0.0).unwrap());
    assert!(!editor.is_animating(shaken));
    editor.update_object(bounced, &json!({"fill": "#00ff00"})).unwrap();
    assert!(!editor.is_animating(bounced));

    editor.tick(10_000.0);
    let a = editor.scene().get(shaken).unwrap();
    assert_eq!((a.geometry.left, a.geometry.top), (310.0, 100.0));
    let b = editor.scene().get(bounced).unwrap();
    assert_eq!((b.geometry.left, b.geometry.top), (600.0, 100.0));
    assert_eq!(b.paint.fill.as_deref(), Some("#00ff00"));

    editor.undo().unwrap();
    assert_eq!(editor.scene().get(shaken).unwrap().geometry.left, 310.0);
    assert_eq!(editor.scene().get(bounced).unwrap().geometry.top, 100.0);
}

#[test]
fn deferred_previews_report_through_take_finished() {
    let (mut editor, _) = session();
    let a = square(&mut editor, 0.0);
    let b = square(&mut editor, 200.0);
    editor.run_animation_deferred(a, "pulse").unwrap();
    editor.run_animation_deferred(b, "wobble").unwrap();
    assert!(editor.run_animation_deferred(a, "pulse").is_err());
    assert_eq!(editor.take_finished(), vec![b]);

    editor.tick(0.0);
    assert!(editor.take_finished().is_empty());
    editor.execute_command(r##"{"action": "set_background", "params": {"color": "#000000"}}"##);
    editor.tick(10_000.0);
    assert_eq!(editor.take_finished(), vec![a]);
    assert!(editor.take_finished().is_empty());
}

#[test]
fn mixed_edits_undo_and_redo_scene_for_scene() {
    let (mut editor, _) = session();
    let mut states = vec![editor.scene().to_snapshot().unwrap()];
    let a = square(&mut editor, 0.0);
    states.push(editor.scene().to_snapshot().unwrap());
    let b = square(&mut editor, 200.0);
    states.push(editor.scene().to_snapshot().unwrap());
    editor.update_object(a, &json!({"fill": "#00ff00", "opacity": 0.5, "left": 40.0, "stroke": "#000000", "strokeWidth": 4.0})).unwrap();
    states.push(editor.scene().to_snapshot().unwrap());
    assert!(editor.reorder(0, 1).unwrap());
    states.push(editor.scene().to_snapshot().unwrap());
    editor.copy_style(a);
    assert!(editor.paste_style(b).unwrap());
    states.push(editor.scene().to_snapshot().unwrap());
    editor.toggle_visibility(b).unwrap();
    states.push(editor.scene().to_snapshot().unwrap());

    assert_eq!(editor.history().len(), states.len());
    for expected in states.iter().rev().skip(1) {
        assert!(editor.undo().unwrap());
        assert_eq!(&editor.scene().to_snapshot().unwrap(), expected);
    }
    assert!(!editor.undo().unwrap());
    for expected in states.iter().skip(1) {
        assert!(editor.redo().unwrap());
        assert_eq!(&editor.scene().to_snapshot().unwrap(), expected);
    }
    assert!(!editor.can_redo());
    assert_eq!(editor.scene().objects()[0].id, b);
}

#[test]
fn commands_drive_a_full_session() {
    let (mut editor, host) = session();
    let r: serde_json::Value =
        serde_json::from_str(&editor.execute_command(&json!({"action": "add_widget", "params": {"widgetType": "countdown", "payload": {"label": "Launch"}}}).to_string())).unwrap();
    let id = r["id"].as_u64().unwrap();
    editor.execute_command(&json!({"action": "apply_animation", "params": {"id": id, "effect": "fade-in"}}).to_string());
    editor.execute_command(r#"{"action": "save", "params": {}}"#);
    let saved: serde_json::Value = serde_json::from_str(&host.last_save().unwrap()).unwrap();
    let widget = &saved["objects"][0];
    assert_eq!(widget["kind"]["widgetType"], "countdown");
    assert_eq!(widget["kind"]["payload"]["label"], "Launch");
    assert_eq!(widget["animations"][0]["effectId"], "fade-in");
}

proptest! {
    #[test]
    fn pasting_a_style_twice_equals_once(fill in "#[0-9a-f]{6}", opacity in 0.0f64..1.0, width in 0.0f64..20.0) {
        let (mut editor, _) = session();
        let source = square(&mut editor, 0.0);
        let target = square(&mut editor, 200.0);
        editor.update_object(source, &json!({"fill": fill, "opacity": opacity, "stroke": "#000000", "strokeWidth": width})).unwrap();
        editor.copy_style(source);
        editor.paste_style(target).unwrap();
        let once = editor.scene().get(target).unwrap().clone();
        editor.paste_style(target).unwrap();
        let twice = editor.scene().get(target).unwrap();
        prop_assert_eq!(&once, twice);
        prop_assert_eq!(&once.paint, &editor.scene().get(source).unwrap().paint);
        prop_assert_eq!(once.geometry.left, 200.0);
    }
}
