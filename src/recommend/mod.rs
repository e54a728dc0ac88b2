//! Diagnosis name → description and care advice
//!
//! Pure lookups over the condition registry.

use crate::conditions;

/// Advice appended to every recommendation list
pub const UNIVERSAL_RECOMMENDATIONS: [&str; 2] = [
    "Consult an ophthalmologist for a comprehensive eye examination",
    "Protect your eyes from UV radiation by wearing sunglasses outdoors",
];

/// Description used when the diagnosis is not in the registry
pub const GENERIC_DESCRIPTION: &str = "An eye condition that affects vision or eye health.";

/// Ordered advice for a diagnosis: condition-specific first, universal last.
///
/// Unknown names yield exactly the universal list.
pub fn recommendations(diagnosis: &str) -> Vec<String> {
    let specific = conditions::find(diagnosis)
        .map(|c| c.recommendations)
        .unwrap_or(&[]);

    specific
        .iter()
        .chain(UNIVERSAL_RECOMMENDATIONS.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Human description for a diagnosis
pub fn description(diagnosis: &str) -> &'static str {
    conditions::find(diagnosis)
        .map(|c| c.description)
        .unwrap_or(GENERIC_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_diagnosis_gets_universal_only() {
        let recs = recommendations("Conjunctivitis");
        assert_eq!(recs, UNIVERSAL_RECOMMENDATIONS.map(String::from).to_vec());
    }

    #[test]
    fn test_specific_advice_comes_first() {
        let recs = recommendations("Cataract");
        assert_eq!(recs[0], "Avoid driving at night if you experience glare or halos");
        let tail = &recs[recs.len() - 2..];
        assert_eq!(tail, &UNIVERSAL_RECOMMENDATIONS.map(String::from));
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(recommendations("KERATITIS"), recommendations("Keratitis"));
        assert_eq!(description("pterygium"), description("Pterygium"));
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(description("Unknown"), GENERIC_DESCRIPTION);
        assert!(description("Hypopyon").contains("anterior chamber"));
    }
}
