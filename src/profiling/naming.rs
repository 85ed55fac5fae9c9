//! Rule-based naming of style clusters.
//!
//! Archetypes are checked in order; the first one with any keyword found
//! (as a substring, case-insensitive) in the matching dominant value wins.

use super::analyze::DominantAttributes;
use crate::records::AttributeField;

pub const MIXED_STYLE: &str = "Mixed Style";

struct Archetype {
    name: &'static str,
    aesthetic: &'static [&'static str],
    silhouette: &'static [&'static str],
    overall: &'static [&'static str],
    formality: &'static [&'static str],
    fabrication: &'static [&'static str],
    color: &'static [&'static str],
}

const ARCHETYPES: &[Archetype] = &[
    Archetype {
        name: "Minimalist Tailoring",
        aesthetic: &["minimalist", "clean"],
        silhouette: &["structured", "tailored"],
        overall: &["professional"],
        formality: &["formal"],
        fabrication: &["wool", "suiting"],
        color: &[],
    },
    Archetype {
        name: "Fluid Evening",
        aesthetic: &["elegant", "sophisticated"],
        silhouette: &["fluid", "flowing", "a-line"],
        overall: &["evening", "formal"],
        formality: &[],
        fabrication: &["silk", "charmeuse"],
        color: &["glossy"],
    },
    Archetype {
        name: "Experimental Edge",
        aesthetic: &["experimental", "avant", "edgy"],
        silhouette: &["deconstructed", "asymmetric"],
        overall: &["unconventional"],
        formality: &[],
        fabrication: &["technical", "innovative"],
        color: &[],
    },
    Archetype {
        name: "Sporty Chic",
        aesthetic: &["sporty", "athletic", "casual"],
        silhouette: &["relaxed", "loose"],
        overall: &["sporty", "casual"],
        formality: &[],
        fabrication: &["jersey", "knit"],
        color: &[],
    },
    Archetype {
        name: "Romantic Bohemian",
        aesthetic: &["romantic", "bohemian", "feminine"],
        silhouette: &["flowing", "draped"],
        overall: &["boho", "artistic"],
        formality: &[],
        fabrication: &["chiffon", "lace"],
        color: &[],
    },
    Archetype {
        name: "Urban Contemporary",
        aesthetic: &["contemporary", "modern", "urban"],
        silhouette: &[],
        overall: &["versatile", "smart-casual"],
        formality: &[],
        fabrication: &["cotton", "denim"],
        color: &[],
    },
    Archetype {
        name: "Classic Refined",
        aesthetic: &["classic", "refined", "traditional"],
        silhouette: &["fitted", "traditional"],
        overall: &["business", "polished"],
        formality: &[],
        fabrication: &[],
        color: &[],
    },
];

/// Lower-cased dominant values consulted by the naming rules.
struct NamingInput {
    aesthetic: Option<String>,
    silhouette: Option<String>,
    overall: Option<String>,
    formality: Option<String>,
    fabrication: Option<String>,
    color: Option<String>,
}

impl NamingInput {
    fn from_dominant(dominant: &DominantAttributes) -> Self {
        let get = |field: AttributeField| {
            dominant
                .get(field.dominant_key())
                .map(|d| d.value.to_lowercase())
        };
        Self {
            aesthetic: get(AttributeField::Aesthetic),
            silhouette: get(AttributeField::Silhouette),
            overall: get(AttributeField::OverallStyle),
            formality: get(AttributeField::Formality),
            fabrication: get(AttributeField::Fabrication),
            color: get(AttributeField::PrimaryColor),
        }
    }

    fn is_empty(&self) -> bool {
        self.aesthetic.is_none()
            && self.silhouette.is_none()
            && self.overall.is_none()
            && self.formality.is_none()
            && self.fabrication.is_none()
            && self.color.is_none()
    }
}

fn mentions(value: &Option<String>, keywords: &[&str]) -> bool {
    value
        .as_deref()
        .is_some_and(|v| keywords.iter().any(|k| v.contains(k)))
}

/// Derives a human-readable style name from a cluster's dominant attributes.
pub fn style_name(dominant: &DominantAttributes) -> String {
    let input = NamingInput::from_dominant(dominant);
    if input.is_empty() {
        return MIXED_STYLE.to_string();
    }
    // "informal" must not read as formal.
    let formality = input.formality.clone().filter(|f| !f.contains("informal"));
    for archetype in ARCHETYPES {
        if mentions(&input.aesthetic, archetype.aesthetic)
            || mentions(&input.silhouette, archetype.silhouette)
            || mentions(&input.overall, archetype.overall)
            || mentions(&formality, archetype.formality)
            || mentions(&input.fabrication, archetype.fabrication)
            || mentions(&input.color, archetype.color)
        {
            return archetype.name.to_string();
        }
    }
    composed_name(&input)
}

fn composed_name(input: &NamingInput) -> String {
    let lead = input
        .aesthetic
        .as_deref()
        .or(input.overall.as_deref())
        .map(title_case)
        .unwrap_or_else(|| "Contemporary".to_string());
    let tail = match input.silhouette.as_deref() {
        Some("tailored" | "structured") => "Tailoring".to_string(),
        Some("fluid" | "flowing" | "draped") => "Flow".to_string(),
        _ => input
            .fabrication
            .as_deref()
            .map(title_case)
            .unwrap_or_else(|| "Mix".to_string()),
    };
    format!("{lead} {tail}")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
