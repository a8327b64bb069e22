//! Plain-text card rendering for non-visual hosts.

use crate::scryfall::Card;

/// Visible delimiter between the faces of a multi-faced card.
const FACE_SEPARATOR: &str = "\n\n---\n\n";

/// Renders a card as an oracle-style text document.
///
/// Multi-faced cards render one `name/type/mana/oracle` block per face in
/// upstream order; the top-level presentation fields are never emitted for
/// them. Set, rarity, release date, colours, non-empty prices and the
/// card's links are appended in all cases.
#[must_use]
pub fn format_card_text(card: &Card) -> String {
    let body = card.faces().map_or_else(
        || {
            face_block(
                &card.name,
                card.type_line.as_deref(),
                card.mana_cost.as_deref(),
                card.oracle_text.as_deref(),
            )
        },
        |faces| {
            faces
                .iter()
                .map(|face| {
                    face_block(
                        face.name.as_deref().unwrap_or(""),
                        face.type_line.as_deref(),
                        face.mana_cost.as_deref(),
                        face.oracle_text.as_deref(),
                    )
                })
                .collect::<Vec<_>>()
                .join(FACE_SEPARATOR)
        },
    );

    let mut out = body;
    out.push_str("\n\n");
    out.push_str(&format!(
        "Set: {} ({})\n",
        card.set_name,
        card.set.to_uppercase()
    ));
    out.push_str(&format!("Rarity: {}\n", card.rarity));
    out.push_str(&format!("Released: {}", card.released_at));

    if let Some(colors) = &card.colors {
        if !colors.is_empty() {
            out.push_str(&format!("\nColors: {}", colors.join(", ")));
        }
    }

    let prices = non_empty_prices(card);
    if !prices.is_empty() {
        let listed: Vec<String> = prices
            .iter()
            .map(|(name, value)| format!("{}: {value}", name.replace('_', " ")))
            .collect();
        out.push_str(&format!("\nPrices: {}", listed.join(", ")));
    }

    out.push_str(&format!("\nScryfall: {}", card.web_url()));
    if let Some(uri) = &card.uri {
        out.push_str(&format!("\nAPI: {uri}"));
    }

    out
}

/// One `name\ntype\nmana\n\noracle` block. Absent fields render as empty
/// lines so the block shape stays stable.
fn face_block(
    name: &str,
    type_line: Option<&str>,
    mana_cost: Option<&str>,
    oracle_text: Option<&str>,
) -> String {
    format!(
        "{name}\n{}\n{}\n\n{}",
        type_line.unwrap_or(""),
        mana_cost.unwrap_or(""),
        oracle_text.unwrap_or("")
    )
}

/// Price entries that have an actual value (non-null, non-empty string).
pub(crate) fn non_empty_prices(card: &Card) -> Vec<(&str, &str)> {
    card.prices
        .iter()
        .filter_map(|(name, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((name.as_str(), v)),
            _ => None,
        })
        .collect()
}
