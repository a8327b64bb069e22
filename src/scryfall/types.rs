//! Data types for the Scryfall API surface.
//!
//! These structures mirror the subset of the Scryfall card schema this
//! server consumes. Unknown upstream fields are ignored during
//! deserialisation; everything kept here passes through to tool output
//! unmodified except for field selection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One printed side of a multi-faced card (transform, modal DFC).
///
/// Every field is optional: Scryfall populates faces unevenly depending on
/// the card layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    /// Face name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Face type line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,

    /// Face mana cost, e.g. `{1}{W}{U}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,

    /// Face rules text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,

    /// Face images, keyed by resolution/crop name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<BTreeMap<String, String>>,
}

/// A full Scryfall card record.
///
/// Invariant: a record has *either* usable top-level presentation fields
/// *or* two-plus entries in `card_faces`. When [`Card::is_multifaced`]
/// returns true the faces are authoritative and the top-level
/// `name`/`type_line`/`mana_cost`/`oracle_text` must not be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Opaque unique identifier, stable across requests.
    pub id: String,

    /// Card name.
    pub name: String,

    /// Human-facing card page on scryfall.com.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scryfall_uri: Option<String>,

    /// Machine API self-link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Set code, e.g. `mkm`.
    pub set: String,

    /// Full set name.
    pub set_name: String,

    /// Collector number within the set.
    pub collector_number: String,

    /// Type line, e.g. `Legendary Creature — Scarecrow`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,

    /// Mana cost. Absent for lands and some other card types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,

    /// Rules text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,

    /// Ordered colour codes (`W`, `U`, `B`, `R`, `G`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,

    /// Rarity, lowercase, e.g. `mythic`.
    pub rarity: String,

    /// ISO release date.
    pub released_at: String,

    /// Price-category name to decimal-string value. A `null` value means
    /// no price exists in that category/currency.
    #[serde(default)]
    pub prices: BTreeMap<String, Option<String>>,

    /// Card images, keyed by resolution/crop name. Single-faced cards only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<BTreeMap<String, String>>,

    /// Faces of a multi-faced card. Absent for single-faced cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_faces: Option<Vec<CardFace>>,
}

impl Card {
    /// Returns true when `card_faces` has two or more entries, in which
    /// case the faces are authoritative over the top-level fields.
    #[must_use]
    pub fn is_multifaced(&self) -> bool {
        self.card_faces.as_ref().is_some_and(|faces| faces.len() >= 2)
    }

    /// Returns the faces when the card is multi-faced.
    #[must_use]
    pub fn faces(&self) -> Option<&[CardFace]> {
        match &self.card_faces {
            Some(faces) if faces.len() >= 2 => Some(faces),
            _ => None,
        }
    }

    /// Returns the human-facing web URL, falling back to a constructed
    /// scryfall.com page when the record lacks a direct link.
    #[must_use]
    pub fn web_url(&self) -> String {
        self.scryfall_uri.clone().unwrap_or_else(|| {
            format!(
                "https://scryfall.com/card/{}/{}",
                self.set, self.collector_number
            )
        })
    }

    /// Returns the card's images, falling back to the first face's images
    /// for multi-faced cards that carry no top-level `image_uris`.
    #[must_use]
    pub fn primary_image_uris(&self) -> Option<&BTreeMap<String, String>> {
        self.image_uris.as_ref().or_else(|| {
            self.card_faces
                .as_ref()
                .and_then(|faces| faces.first())
                .and_then(|face| face.image_uris.as_ref())
        })
    }
}

/// First page of a Scryfall search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching cards in upstream order.
    pub data: Vec<Card>,

    /// Total matches across all pages.
    #[serde(default)]
    pub total_cards: u64,

    /// Whether further pages exist (never followed).
    #[serde(default)]
    pub has_more: bool,
}

/// A failed API call: any non-2xx upstream response or transport failure.
///
/// Transport failures (DNS, connection refused, timeout) are folded into
/// the same shape with `status: 0` so callers have one uniform failure
/// channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    /// HTTP status code, or 0 for transport-level failures.
    pub status: u16,

    /// Raw response body, or a transport failure description. Not parsed
    /// as JSON: Scryfall error bodies need not match the success schema.
    pub body: String,
}

impl ApiFailure {
    /// Wraps a transport-level failure (no HTTP status available).
    #[must_use]
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: 0,
            body: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.status == 0 {
            write!(f, "transport failure: {}", self.body)
        } else {
            write!(f, "HTTP {}: {}", self.status, self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card_json() -> &'static str {
        r#"{
            "id": "f295b713-1d6a-43fd-910d-fb35414bf58a",
            "name": "Dusk // Dawn",
            "scryfall_uri": "https://scryfall.com/card/akh/210/dusk-dawn",
            "uri": "https://api.scryfall.com/cards/f295b713-1d6a-43fd-910d-fb35414bf58a",
            "set": "akh",
            "set_name": "Amonkhet",
            "collector_number": "210",
            "type_line": "Sorcery // Sorcery",
            "rarity": "rare",
            "released_at": "2017-04-28",
            "layout": "split",
            "prices": {"usd": "0.40", "usd_foil": null},
            "card_faces": [
                {"name": "Dusk", "type_line": "Sorcery", "mana_cost": "{2}{W}{W}",
                 "oracle_text": "Destroy all creatures with power 3 or greater."},
                {"name": "Dawn", "type_line": "Sorcery", "mana_cost": "{3}{W}{W}",
                 "oracle_text": "Return all creature cards with power 2 or less from your graveyard to your hand."}
            ]
        }"#
    }

    #[test]
    fn deserialise_multifaced_card() {
        let card: Card = serde_json::from_str(sample_card_json()).unwrap();
        assert!(card.is_multifaced());
        let faces = card.faces().unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].name.as_deref(), Some("Dusk"));
        // Unknown fields like "layout" are ignored
        assert_eq!(card.prices.get("usd").unwrap().as_deref(), Some("0.40"));
        assert_eq!(card.prices.get("usd_foil").unwrap(), &None);
    }

    #[test]
    fn single_face_list_is_not_multifaced() {
        let card = Card {
            card_faces: Some(vec![CardFace::default()]),
            ..Card::default()
        };
        assert!(!card.is_multifaced());
        assert!(card.faces().is_none());
    }

    #[test]
    fn web_url_falls_back_to_constructed_page() {
        let card = Card {
            set: "mkm".to_string(),
            collector_number: "42".to_string(),
            ..Card::default()
        };
        assert_eq!(card.web_url(), "https://scryfall.com/card/mkm/42");

        let card = Card {
            scryfall_uri: Some("https://scryfall.com/card/mkm/42/x".to_string()),
            ..card
        };
        assert_eq!(card.web_url(), "https://scryfall.com/card/mkm/42/x");
    }

    #[test]
    fn primary_images_fall_back_to_first_face() {
        let mut face_uris = BTreeMap::new();
        face_uris.insert("normal".to_string(), "https://cards.scryfall.io/a.jpg".to_string());

        let card = Card {
            card_faces: Some(vec![
                CardFace {
                    image_uris: Some(face_uris.clone()),
                    ..CardFace::default()
                },
                CardFace::default(),
            ]),
            ..Card::default()
        };
        assert_eq!(card.primary_image_uris(), Some(&face_uris));
    }

    #[test]
    fn search_response_defaults() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(resp.data.is_empty());
        assert_eq!(resp.total_cards, 0);
        assert!(!resp.has_more);
    }

    #[test]
    fn api_failure_display() {
        let failure = ApiFailure {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(failure.to_string(), "HTTP 404: Not Found");

        let failure = ApiFailure {
            status: 0,
            body: "dns error".to_string(),
        };
        assert!(failure.to_string().starts_with("transport failure"));
    }
}
