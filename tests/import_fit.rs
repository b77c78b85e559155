use proptest::prelude::*;
use signage_engine::{import_svg, ImportOptions};

type Rect = (f64, f64, f64, f64);
/// `(x, baseline y, font size, content)`.
type Label = (f64, f64, f64, String);

fn arb_svg() -> impl Strategy<Value = (f64, f64, Vec<Rect>, Vec<Label>)> {
    (50.0f64..4000.0, 50.0f64..4000.0).prop_flat_map(|(w, h)| {
        let rect = (0.0..0.9f64, 0.0..0.9f64, 0.01..1.0f64, 0.01..1.0f64)
            .prop_map(move |(x, y, rw, rh)| (x * w, y * h, rw * (1.0 - x) * w, rh * (1.0 - y) * h));
        // Text boxes are `0.6 * size` per glyph wide and `1.16 * size` tall, with the
        // baseline `0.9 * size` below the top; keep the whole box inside the source.
        let label = (0.01..0.1f64, 0.0..1.0f64, 0.0..1.0f64, "[A-Za-z]{1,6}").prop_map(move |(sf, xf, yf, content)| {
            let size = sf * w.min(h);
            let width = content.chars().count() as f64 * size * 0.6;
            let x = xf * (w - width);
            let y = 0.9 * size + yf * (h - 1.16 * size);
            (x, y, size, content)
        });
        (Just(w), Just(h), prop::collection::vec(rect, 1..6), prop::collection::vec(label, 0..4))
    })
}

proptest! {
    #[test]
    fn imported_content_fits_the_canvas((w, h, rects, labels) in arb_svg(), target_w in 320.0f64..3840.0, target_h in 320.0f64..3840.0) {
        let shapes = rects
            .iter()
            .map(|(x, y, rw, rh)| format!(r#"<rect x="{x}" y="{y}" width="{rw}" height="{rh}"/>"#));
        let texts = labels
            .iter()
            .map(|(x, y, size, content)| format!(r#"<text x="{x}" y="{y}" font-size="{size}">{content}</text>"#));
        let body: String = shapes.chain(texts).collect();
        let markup = format!(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">{body}</svg>"#);
        let imported = import_svg(&markup, &ImportOptions::fit_to(target_w, target_h)).unwrap();

        prop_assert_eq!(imported.objects.len(), rects.len() + labels.len());
        prop_assert!(!imported.embedded);
        let scale = (target_w / w).min(target_h / h);
        prop_assert!((imported.fit.scale - scale).abs() < 1e-9);
        let text_count = imported.objects.iter().filter(|o| o.text_data().is_some()).count();
        prop_assert_eq!(text_count, labels.len());
        for obj in &imported.objects {
            prop_assert!(obj.world_bounds().within(target_w, target_h, 1e-6), "{} {:?} outside {}x{}", obj.name, obj.world_bounds(), target_w, target_h);
        }
    }
}

#[test]
fn portrait_template_is_letterboxed_horizontally() {
    let svg = r##"<svg width="1080" height="1920"><rect width="1080" height="1920" fill="#222"/></svg>"##;
    let imported = import_svg(svg, &ImportOptions::fit_to(1920.0, 1080.0)).unwrap();
    let b = imported.objects[0].world_bounds();
    let scale = 1080.0 / 1920.0;
    assert!((imported.fit.scale - scale).abs() < 1e-12);
    assert!((b.width() - 1080.0 * scale).abs() < 1e-6);
    assert!((b.min_x - (1920.0 - 1080.0 * scale) / 2.0).abs() < 1e-6);
    assert!(b.min_y.abs() < 1e-6);
}

#[test]
fn nested_group_transforms_compose() {
    let svg = r#"<svg viewBox="0 0 200 100">
        <g transform="translate(100 0)"><g transform="scale(0.5)"><rect width="100" height="100"/></g></g>
    </svg>"#;
    let imported = import_svg(svg, &ImportOptions::fit_to(400.0, 200.0)).unwrap();
    let b = imported.objects[0].world_bounds();
    assert!((b.min_x - 200.0).abs() < 1e-6, "{b:?}");
    assert!((b.width() - 100.0).abs() < 1e-6, "{b:?}");
}

#[test]
fn broken_nodes_are_skipped_not_fatal() {
    let svg = r#"<svg width="100" height="100">
        <rect width="10" height="10"/>
        <path d=""/>
        <rect width="10" height="10" transform="rotate(oops)"/>
        <foreignObject><div/></foreignObject>
    </svg>"#;
    let imported = import_svg(svg, &ImportOptions::fit_to(100.0, 100.0)).unwrap();
    assert_eq!(imported.objects.len(), 1);
    assert!(imported.skipped >= 2);
}
