//! Registry of diagnosable eye conditions
//!
//! The registry is immutable static data. Declaration order matters: the
//! ranker breaks probability ties by it.

use crate::color::ColorName;
use serde::Serialize;

/// One fixed registry entry
#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    /// Display and lookup name
    pub name: &'static str,

    /// Case-insensitive substrings matched against service labels
    pub keywords: &'static [&'static str],

    /// Dominant-color buckets that support this condition
    pub color_traits: &'static [ColorName],

    pub description: &'static str,

    /// Condition-specific advice, most important first
    pub recommendations: &'static [&'static str],

    /// Scored by the heuristic backend; reference-only entries are not
    pub screened: bool,
}

impl Condition {
    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

static CONDITIONS: [Condition; 9] = [
    Condition {
        name: "Cataract",
        keywords: &["cataract", "cloudy", "white", "opacity", "eye condition", "lens", "elderly", "aging"],
        color_traits: &[ColorName::White, ColorName::Gray],
        description: "A clouding of the eye's natural lens, which lies behind the iris and the pupil.",
        recommendations: &[
            "Avoid driving at night if you experience glare or halos",
            "Consider discussing surgical options with your doctor if vision is significantly affected",
            "Ensure your eyeglass prescription is up to date",
            "Use brighter lighting for reading and other activities",
        ],
        screened: true,
    },
    Condition {
        name: "Pterygium",
        keywords: &["pterygium", "growth", "tissue", "conjunctiva", "eye surface", "cornea"],
        color_traits: &[ColorName::Pink, ColorName::Red],
        description: "A growth of pink, fleshy tissue on the conjunctiva, often extending onto the cornea.",
        recommendations: &[
            "Use artificial tears for dryness or irritation",
            "Wear UV-blocking sunglasses and wide-brimmed hats outdoors",
            "Avoid dusty and windy environments when possible",
            "Consider surgical removal if it affects vision or causes discomfort",
        ],
        screened: true,
    },
    Condition {
        name: "Normal",
        keywords: &["eye", "healthy", "normal", "iris", "pupil", "clear", "vision"],
        color_traits: &[ColorName::Blue, ColorName::Brown, ColorName::Green, ColorName::Black],
        description: "No apparent eye disease detected in the image.",
        recommendations: &[
            "Continue regular eye check-ups (at least once every two years)",
            "Follow the 20-20-20 rule when using digital devices: every 20 minutes, look at something 20 feet away for 20 seconds",
            "Maintain a balanced diet rich in eye-healthy nutrients like omega-3 fatty acids and vitamins A, C, and E",
        ],
        screened: true,
    },
    Condition {
        name: "Glaucoma",
        keywords: &["glaucoma", "pressure", "optic nerve", "eye disease", "vision loss"],
        color_traits: &[ColorName::Red],
        description: "A group of conditions that damage the optic nerve, usually linked to raised pressure inside the eye.",
        recommendations: &[
            "Use prescribed eye drops regularly",
            "Attend regular follow-up appointments to monitor eye pressure",
            "Consider discussing surgical options with your ophthalmologist if medication is insufficient",
        ],
        screened: true,
    },
    Condition {
        name: "stye",
        keywords: &["stye", "sty", "infection", "eyelid", "bump", "swelling", "redness"],
        color_traits: &[ColorName::Red],
        description: "A painful red lump near the edge of the eyelid caused by an infected oil gland or eyelash follicle.",
        recommendations: &[
            "Apply warm compresses to the affected area several times a day",
            "Keep eyelids clean with gentle baby shampoo",
            "Avoid wearing makeup until the stye resolves",
        ],
        screened: true,
    },
    Condition {
        name: "strabismus",
        keywords: &["strabismus", "crossed", "misaligned", "eye position", "squint"],
        color_traits: &[],
        description: "A misalignment of the eyes, where both eyes do not look at the same point at the same time.",
        recommendations: &[
            "Consult a specialist for potential vision therapy",
            "Special eyeglasses may help in some cases",
            "Surgery may be recommended to align the eyes properly",
        ],
        screened: true,
    },
    Condition {
        name: "Keratitis",
        keywords: &["keratitis", "cornea", "inflammation"],
        color_traits: &[],
        description: "Inflammation of the cornea, the clear, dome-shaped tissue on the front of the eye.",
        recommendations: &[
            "Avoid wearing contact lenses until examined by a doctor",
            "Apply prescribed antibiotic or antifungal eye drops as directed",
            "Avoid touching or rubbing your eyes",
        ],
        screened: false,
    },
    Condition {
        name: "Chalazion",
        keywords: &["chalazion", "eyelid", "bump"],
        color_traits: &[],
        description: "A small bump on the eyelid caused by a blocked oil gland.",
        recommendations: &[
            "Apply warm compresses to the affected eye several times daily",
            "Gently massage the affected area to help drain the blocked gland",
            "Avoid eye makeup until the chalazion resolves",
        ],
        screened: false,
    },
    Condition {
        name: "Hypopyon",
        keywords: &["hypopyon", "anterior chamber", "pus"],
        color_traits: &[],
        description: "A collection of white blood cells in the anterior chamber of the eye, often a sign of severe inflammation or infection.",
        recommendations: &[
            "Seek immediate medical attention as this may indicate serious infection",
            "Take prescribed antibiotics or anti-inflammatory medication as directed",
            "Avoid contact lens wear and eye makeup",
        ],
        screened: false,
    },
];

/// All registry entries in declaration order
pub fn all() -> &'static [Condition] {
    &CONDITIONS
}

/// Entries the heuristic backend scores, in declaration order
pub fn screened() -> impl Iterator<Item = &'static Condition> {
    CONDITIONS.iter().filter(|c| c.screened)
}

/// Case-insensitive lookup by name
pub fn find(name: &str) -> Option<&'static Condition> {
    CONDITIONS.iter().find(|c| c.is_named(name))
}
