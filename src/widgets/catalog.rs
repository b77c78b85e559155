use serde_json::{json, Map, Value};

use super::{PartContent, PartShape, WidgetPart, WidgetSpec};
use crate::error::EditorResult;

const GENERIC_WIDTH: f64 = 400.0;
const GENERIC_HEIGHT: f64 = 240.0;

/// Label, icon and accent for kinds that only need the generic placeholder layout.
#[derive(Clone, Debug)]
struct GenericEntry {
    kind: String,
    label: String,
    icon: String,
    accent_color: String,
}

const GENERIC_TABLE: &[(&str, &str, &str, &str)] = &[
    ("rss", "RSS Feed", "📰", "#f97316"),
    ("qrcode", "QR Code", "▦", "#111827"),
    ("webpage", "Web Page", "🌐", "#0ea5e9"),
    ("stocks", "Stocks", "📈", "#16a34a"),
    ("traffic", "Traffic", "🚦", "#dc2626"),
    ("menu", "Menu Board", "🍽", "#b45309"),
];

const DEFAULT_ENTRY: (&str, &str, &str) = ("Widget", "▣", "#6b7280");

fn text(content: PartContent, offset_y: f64, width: f64, font_size: f64) -> WidgetPart {
    WidgetPart {
        shape: PartShape::Text { font_size, font_weight: "bold".to_string(), content },
        offset_x: 0.0,
        offset_y,
        width,
        height: font_size * 1.16,
        fill: None,
    }
}

fn literal(s: &str) -> PartContent {
    PartContent::Literal { text: s.to_string() }
}

fn payload(key: &str, fallback: &str) -> PartContent {
    PartContent::Payload { key: key.to_string(), fallback: fallback.to_string() }
}

fn defaults(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn spec(kind: &str, label: &str, icon: &str, accent: &str, width: f64, height: f64, defaults_json: Value, parts: Vec<WidgetPart>) -> WidgetSpec {
    WidgetSpec {
        kind: kind.to_string(),
        label: label.to_string(),
        icon: icon.to_string(),
        accent_color: accent.to_string(),
        width,
        height,
        defaults: defaults(defaults_json),
        parts,
    }
}

fn generic_spec(kind: &str, label: &str, icon: &str, accent: &str) -> WidgetSpec {
    spec(
        kind,
        label,
        icon,
        accent,
        GENERIC_WIDTH,
        GENERIC_HEIGHT,
        json!({}),
        vec![text(PartContent::Icon, -30.0, 120.0, 64.0), text(PartContent::Label, 60.0, 360.0, 28.0)],
    )
}

fn builtin_specs() -> Vec<WidgetSpec> {
    vec![
        spec("time", "Clock", "🕒", "#1d4ed8", 360.0, 160.0, json!({"format": "HH:mm", "timezone": "local"}),
            vec![text(literal("12:45"), -12.0, 320.0, 72.0), text(payload("timezone", "local"), 52.0, 320.0, 20.0)]),
        spec("date", "Date", "📅", "#7c3aed", 420.0, 140.0, json!({"format": "ddd, MMM D"}),
            vec![text(literal("Mon, Jan 1"), 0.0, 380.0, 48.0)]),
        spec("weather", "Weather", "⛅", "#0284c7", 360.0, 220.0, json!({"location": "", "units": "metric"}),
            vec![text(PartContent::Icon, -30.0, 120.0, 72.0), text(payload("location", "Weather"), 60.0, 320.0, 26.0)]),
        spec("countdown", "Countdown", "⏳", "#be123c", 480.0, 180.0, json!({"targetDate": "", "label": "Countdown"}),
            vec![text(literal("00 : 00 : 00"), -14.0, 440.0, 56.0), text(payload("label", "Countdown"), 56.0, 440.0, 22.0)]),
        spec("calendar", "Calendar", "🗓", "#0f766e", 480.0, 360.0, json!({"calendarUrl": ""}),
            vec![text(PartContent::Icon, -40.0, 140.0, 96.0), text(PartContent::Label, 100.0, 440.0, 30.0)]),
        spec("playlist", "Playlist", "🎵", "#9333ea", 480.0, 270.0, json!({"playlistId": ""}),
            vec![text(PartContent::Icon, -30.0, 140.0, 80.0), text(PartContent::Label, 80.0, 440.0, 28.0)]),
        spec("video", "Video", "▶", "#111827", 640.0, 360.0, json!({"url": ""}),
            vec![
                WidgetPart { shape: PartShape::Triangle, offset_x: 0.0, offset_y: -20.0, width: 80.0, height: 80.0, fill: None },
                text(payload("url", "Video"), 120.0, 600.0, 22.0),
            ]),
        spec("social", "Social Feed", "💬", "#2563eb", 400.0, 400.0, json!({"handle": "@yourbrand", "network": "instagram"}),
            vec![text(PartContent::Icon, -40.0, 140.0, 96.0), text(payload("handle", "@yourbrand"), 90.0, 360.0, 28.0)]),
        spec("ticker", "News Ticker", "📰", "#b91c1c", 1600.0, 90.0, json!({"text": "Breaking news scrolls here", "speed": 60}),
            vec![text(payload("text", "Breaking news scrolls here"), 0.0, 1560.0, 36.0)]),
        generic_spec("generic", "Widget", DEFAULT_ENTRY.1, DEFAULT_ENTRY.2),
    ]
}

/// Specs by kind plus the generic fallback table. Later registrations replace earlier ones.
#[derive(Clone, Debug)]
pub struct WidgetCatalog {
    specs: Vec<WidgetSpec>,
    generic: Vec<GenericEntry>,
}

impl Default for WidgetCatalog {
    fn default() -> Self {
        WidgetCatalog::builtin()
    }
}

impl WidgetCatalog {
    pub fn builtin() -> Self {
        let generic = GENERIC_TABLE
            .iter()
            .map(|(kind, label, icon, accent)| GenericEntry {
                kind: kind.to_string(),
                label: label.to_string(),
                icon: icon.to_string(),
                accent_color: accent.to_string(),
            })
            .collect();
        WidgetCatalog { specs: builtin_specs(), generic }
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.kind.as_str()).chain(self.generic.iter().map(|g| g.kind.as_str())).collect()
    }

    pub fn get(&self, kind: &str) -> Option<&WidgetSpec> {
        self.specs.iter().find(|s| s.kind == kind)
    }

    /// Spec for `kind`; unknown kinds get the generic layout from the lookup table or
    /// the default entry, keeping `kind` as the widget type.
    pub fn resolve(&self, kind: &str) -> WidgetSpec {
        if let Some(spec) = self.get(kind) {
            return spec.clone();
        }
        match self.generic.iter().find(|g| g.kind == kind) {
            Some(g) => generic_spec(kind, &g.label, &g.icon, &g.accent_color),
            None => {
                tracing::debug!(kind, "unknown widget kind, using default placeholder");
                let (label, icon, accent) = DEFAULT_ENTRY;
                generic_spec(kind, label, icon, accent)
            }
        }
    }

    pub fn register(&mut self, spec: WidgetSpec) {
        self.specs.retain(|s| s.kind != spec.kind);
        self.specs.push(spec);
    }

    /// Registers every spec in a JSON array. Returns how many were added.
    pub fn extend_from_json(&mut self, json: &str) -> EditorResult<usize> {
        let specs: Vec<WidgetSpec> = serde_json::from_str(json)?;
        let count = specs.len();
        specs.into_iter().for_each(|s| self.register(s));
        Ok(count)
    }
}
