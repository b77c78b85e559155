/// Generic families and common system faces mapped onto the fonts bundled with the player.
const FONT_MAP: &[(&str, &str)] = &[
    ("sans-serif", "Roboto"),
    ("serif", "Playfair Display"),
    ("monospace", "Roboto Mono"),
    ("arial", "Roboto"),
    ("helvetica", "Roboto"),
    ("times new roman", "Playfair Display"),
    ("georgia", "Merriweather"),
];

/// Strips quotes, keeps the first family of a comma stack, then maps it through the
/// font table. Unmapped names pass through unchanged; an empty stack maps like `sans-serif`.
pub fn normalize_font_family(raw: &str) -> String {
    let first = raw.split(',').next().unwrap_or("");
    let name = first.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let name = if name.is_empty() { "sans-serif" } else { name };
    let lower = name.to_ascii_lowercase();
    FONT_MAP
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| name.to_string())
}
