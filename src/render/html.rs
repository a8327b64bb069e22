//! Escaped HTML card rendering for the viewer surface.
//!
//! Every upstream-originated string is HTML-escaped before insertion.
//! Inline `{X}` mana tokens in oracle text and mana costs become image
//! tags against the Scryfall symbol host. Missing optional fields are
//! omitted from the output entirely, never rendered as empty elements.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::render::text::non_empty_prices;
use crate::scryfall::{Card, CardFace};

/// Host serving the card-symbol SVGs.
const SYMBOL_HOST: &str = "https://svgs.scryfall.io/card-symbols";

/// Image resolutions in preference order.
const IMAGE_PREFERENCE: [&str; 4] = ["normal", "large", "border_crop", "png"];

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("mana symbol regex is valid"))
}

/// Escapes text for safe insertion into HTML content or attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Maps a mana-symbol token to its SVG filename on the symbol host.
///
/// Hybrid symbols drop the slash (`W/U` → `WU`); the two tokens with no
/// direct filename equivalent map to spelled-out names.
#[must_use]
pub fn symbol_to_filename(symbol: &str) -> String {
    match symbol {
        "∞" => "INFINITY".to_string(),
        "½" => "HALF".to_string(),
        _ => symbol.replace('/', ""),
    }
}

/// Replaces `{X}` tokens with mana-symbol image tags.
///
/// The input must already be HTML-escaped; token contents never contain
/// markup characters, so escaping does not disturb them.
#[must_use]
pub fn render_mana_symbols(text: &str) -> String {
    symbol_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let symbol = &caps[1];
            let filename = symbol_to_filename(symbol);
            let escaped = escape_html(symbol);
            format!(
                "<img class=\"mana-symbol\" src=\"{SYMBOL_HOST}/{}.svg\" alt=\"{{{escaped}}}\" title=\"{{{escaped}}}\" />",
                urlencoding::encode(&filename)
            )
        })
        .into_owned()
}

/// Escapes oracle text and substitutes mana symbols.
#[must_use]
pub fn render_oracle_text(text: &str) -> String {
    render_mana_symbols(&escape_html(text))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Picks the preferred image URL from an image map.
fn pick_image_uri(uris: &BTreeMap<String, String>) -> Option<&str> {
    IMAGE_PREFERENCE
        .iter()
        .find_map(|key| uris.get(*key).map(String::as_str))
}

/// One card image with an optional caption. Empty when no image exists.
fn render_card_image(
    uris: Option<&BTreeMap<String, String>>,
    alt: &str,
    label: Option<&str>,
) -> String {
    let Some(uri) = uris.and_then(pick_image_uri) else {
        return String::new();
    };

    let mut html = format!(
        "<img class=\"card-image\" src=\"{}\" alt=\"{}\" loading=\"lazy\" />",
        escape_html(uri),
        escape_html(alt)
    );
    if let Some(label) = label {
        html.push_str(&format!(
            "<div class=\"card-image-label\">{}</div>",
            escape_html(label)
        ));
    }
    html
}

/// The price-tag strip. Empty when no price entry has a value.
fn render_prices(card: &Card) -> String {
    let entries = non_empty_prices(card);
    if entries.is_empty() {
        return String::new();
    }

    let tags: String = entries
        .iter()
        .map(|(name, value)| {
            format!(
                "<div class=\"price-tag\"><span class=\"price-label\">{}</span>${}</div>",
                escape_html(&name.replace('_', " ")),
                escape_html(value)
            )
        })
        .collect();

    format!("<div class=\"card-prices\">{tags}</div>")
}

/// Name/type/mana/oracle block for one face of a multi-faced card.
fn render_face_details(face: &CardFace, index: usize, total: usize) -> String {
    let separator = if index > 0 {
        "<hr class=\"face-separator\" />"
    } else {
        ""
    };
    let face_label = if total > 1 {
        format!(" (Face {})", index + 1)
    } else {
        String::new()
    };

    let mut html = format!(
        "{separator}<h2 class=\"card-name\">{}{face_label}</h2><p class=\"card-type\">{}</p>",
        escape_html(face.name.as_deref().unwrap_or("Unknown")),
        escape_html(face.type_line.as_deref().unwrap_or(""))
    );
    if let Some(mana_cost) = &face.mana_cost {
        html.push_str(&format!(
            "<p class=\"card-mana\">{}</p>",
            render_mana_symbols(&escape_html(mana_cost))
        ));
    }
    if let Some(oracle_text) = &face.oracle_text {
        html.push_str(&format!(
            "<div class=\"card-oracle\">{}</div>",
            render_oracle_text(oracle_text)
        ));
    }
    html
}

/// Metadata definition list: set, number, rarity, release date, colours.
fn render_meta(card: &Card) -> String {
    let mut html = format!(
        "<dl class=\"card-meta\"><dt>Set</dt><dd>{} ({})</dd><dt>Number</dt><dd>{}</dd><dt>Rarity</dt><dd>{}</dd><dt>Released</dt><dd>{}</dd>",
        escape_html(&card.set_name),
        escape_html(&card.set.to_uppercase()),
        escape_html(&card.collector_number),
        capitalize(&card.rarity),
        escape_html(&card.released_at)
    );
    if let Some(colors) = &card.colors {
        if !colors.is_empty() {
            html.push_str(&format!(
                "<dt>Colors</dt><dd>{}</dd>",
                escape_html(&colors.join(", "))
            ));
        }
    }
    html.push_str("</dl>");
    html
}

/// Renders a full card as escaped HTML for the viewer surface.
///
/// Multi-faced cards get one image block and one detail block per face,
/// in upstream face order.
#[must_use]
pub fn render_card_html(card: &Card) -> String {
    let (images_html, details_html) = card.faces().map_or_else(
        || {
            let images = render_card_image(card.primary_image_uris(), &card.name, None);

            let mut details = format!(
                "<h2 class=\"card-name\">{}</h2><p class=\"card-type\">{}</p>",
                escape_html(&card.name),
                escape_html(card.type_line.as_deref().unwrap_or(""))
            );
            if let Some(mana_cost) = &card.mana_cost {
                details.push_str(&format!(
                    "<p class=\"card-mana\">{}</p>",
                    render_mana_symbols(&escape_html(mana_cost))
                ));
            }
            if let Some(oracle_text) = &card.oracle_text {
                details.push_str(&format!(
                    "<div class=\"card-oracle\">{}</div>",
                    render_oracle_text(oracle_text)
                ));
            }

            (images, details)
        },
        |faces| {
            let images: String = faces
                .iter()
                .enumerate()
                .map(|(i, face)| {
                    let alt = face.name.as_deref().unwrap_or(&card.name);
                    let label = face
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("Face {}", i + 1));
                    render_card_image(face.image_uris.as_ref(), alt, Some(&label))
                })
                .collect();

            let details: String = faces
                .iter()
                .enumerate()
                .map(|(i, face)| render_face_details(face, i, faces.len()))
                .collect();

            (images, details)
        },
    );

    format!(
        "<div class=\"card-images\">{images_html}</div><div class=\"card-details\">{details_html}{}{}<a class=\"card-link\" href=\"{}\">View on Scryfall</a></div>",
        render_meta(card),
        render_prices(card),
        escape_html(&card.web_url())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scryfall::{Card, CardFace};

    #[test]
    fn escape_all_special_characters() {
        assert_eq!(
            escape_html(r#"<b>"R&D's" deck</b>"#),
            "&lt;b&gt;&quot;R&amp;D&#39;s&quot; deck&lt;/b&gt;"
        );
    }

    #[test]
    fn hybrid_symbol_drops_slash() {
        assert_eq!(symbol_to_filename("W/U"), "WU");
        assert_eq!(symbol_to_filename("2/U"), "2U");
    }

    #[test]
    fn special_symbols_map_to_names() {
        assert_eq!(symbol_to_filename("∞"), "INFINITY");
        assert_eq!(symbol_to_filename("½"), "HALF");
    }

    #[test]
    fn plain_symbol_is_unchanged() {
        assert_eq!(symbol_to_filename("T"), "T");
        assert_eq!(symbol_to_filename("10"), "10");
    }

    #[test]
    fn mana_symbols_become_image_tags() {
        let html = render_oracle_text("{T}, {2/U}: draw a card.");
        assert_eq!(html.matches("<img class=\"mana-symbol\"").count(), 2);
        assert!(html.contains("card-symbols/T.svg"));
        assert!(html.contains("card-symbols/2U.svg"));
        assert!(html.contains(": draw a card."));
    }

    #[test]
    fn oracle_text_outside_tokens_is_escaped() {
        let html = render_oracle_text("2 < 3 & {T}: so on");
        assert!(html.contains("2 &lt; 3 &amp;"));
        // The only raw angle brackets belong to the generated img tag
        let stripped = html.replace(
            &html[html.find("<img").unwrap()..=html.find("/>").unwrap() + 1],
            "",
        );
        assert!(!stripped.contains('<'));
        assert!(!stripped.contains('>'));
    }

    #[test]
    fn image_preference_order() {
        let mut uris = BTreeMap::new();
        uris.insert("png".to_string(), "https://cards.scryfall.io/p.png".to_string());
        uris.insert("large".to_string(), "https://cards.scryfall.io/l.jpg".to_string());
        assert_eq!(
            pick_image_uri(&uris),
            Some("https://cards.scryfall.io/l.jpg")
        );

        uris.insert("normal".to_string(), "https://cards.scryfall.io/n.jpg".to_string());
        assert_eq!(
            pick_image_uri(&uris),
            Some("https://cards.scryfall.io/n.jpg")
        );
    }

    #[test]
    fn missing_image_renders_nothing() {
        assert_eq!(render_card_image(None, "A Card", None), String::new());
    }

    #[test]
    fn single_faced_card_html() {
        let card = Card {
            name: "Ponder <test>".to_string(),
            type_line: Some("Sorcery".to_string()),
            mana_cost: Some("{U}".to_string()),
            oracle_text: Some("Look at the top three cards of your library.".to_string()),
            set: "lrw".to_string(),
            set_name: "Lorwyn".to_string(),
            collector_number: "79".to_string(),
            rarity: "common".to_string(),
            released_at: "2007-10-12".to_string(),
            ..Card::default()
        };

        let html = render_card_html(&card);
        assert!(html.contains("Ponder &lt;test&gt;"));
        assert!(html.contains("card-symbols/U.svg"));
        assert!(html.contains("<dt>Rarity</dt><dd>Common</dd>"));
        assert!(html.contains("View on Scryfall"));
        // No prices, no price strip
        assert!(!html.contains("card-prices"));
    }

    #[test]
    fn double_faced_card_html_has_per_face_blocks() {
        let card = Card {
            name: "Top Level".to_string(),
            set: "isd".to_string(),
            set_name: "Innistrad".to_string(),
            collector_number: "51".to_string(),
            rarity: "common".to_string(),
            released_at: "2011-09-30".to_string(),
            card_faces: Some(vec![
                CardFace {
                    name: Some("Front".to_string()),
                    type_line: Some("Creature".to_string()),
                    ..CardFace::default()
                },
                CardFace {
                    name: Some("Back".to_string()),
                    type_line: Some("Creature".to_string()),
                    ..CardFace::default()
                },
            ]),
            ..Card::default()
        };

        let html = render_card_html(&card);
        assert!(html.contains("Front (Face 1)"));
        assert!(html.contains("Back (Face 2)"));
        assert_eq!(html.matches("face-separator").count(), 1);
    }
}
