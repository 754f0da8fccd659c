//! Code system alias registry
//!
//! Maps short, human-friendly aliases to canonical code system URIs.
//!
//! Uses a compile-time perfect hash map (phf) for O(1) alias lookups with
//! zero runtime allocation.

use phf::phf_map;

/// Static compile-time alias registry
static CODE_SYSTEMS: phf::Map<&'static str, &'static str> = phf_map! {
    "snomed" => "http://snomed.info/sct",
    "loinc" => "http://loinc.org",
    "icd10" => "http://hl7.org/fhir/sid/icd-10",
    "icd10cm" => "http://hl7.org/fhir/sid/icd-10-cm",
    "rxnorm" => "http://www.nlm.nih.gov/research/umls/rxnorm",
    "cpt" => "http://www.ama-assn.org/go/cpt",
    "ucum" => "http://unitsofmeasure.org",
    "ndc" => "http://hl7.org/fhir/sid/ndc",
};

/// Resolves a code system alias to its canonical URI
///
/// Alias matching is case-insensitive. Anything that is not a known alias,
/// including full URIs, passes through verbatim so callers can always hand
/// the result to a terminology server.
///
/// # Example
///
/// ```rust
/// use rosetta::terminology::resolve_system;
///
/// assert_eq!(resolve_system("snomed"), "http://snomed.info/sct");
/// assert_eq!(resolve_system("http://example.org/codes"), "http://example.org/codes");
/// ```
pub fn resolve_system(system: &str) -> &str {
    match CODE_SYSTEMS.get(system.to_ascii_lowercase().as_str()) {
        Some(uri) => uri,
        None => system,
    }
}

/// All registered aliases, for help text and diagnostics
pub fn known_aliases() -> impl Iterator<Item = (&'static str, &'static str)> {
    CODE_SYSTEMS.entries().map(|(alias, uri)| (*alias, *uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("snomed", "http://snomed.info/sct" ; "snomed")]
    #[test_case("loinc", "http://loinc.org" ; "loinc")]
    #[test_case("icd10", "http://hl7.org/fhir/sid/icd-10" ; "icd10")]
    #[test_case("icd10cm", "http://hl7.org/fhir/sid/icd-10-cm" ; "icd10cm")]
    #[test_case("rxnorm", "http://www.nlm.nih.gov/research/umls/rxnorm" ; "rxnorm")]
    #[test_case("cpt", "http://www.ama-assn.org/go/cpt" ; "cpt")]
    #[test_case("ucum", "http://unitsofmeasure.org" ; "ucum")]
    #[test_case("ndc", "http://hl7.org/fhir/sid/ndc" ; "ndc")]
    fn test_alias_resolution(alias: &str, uri: &str) {
        assert_eq!(resolve_system(alias), uri);
    }

    #[test_case("SNOMED" ; "uppercase")]
    #[test_case("Snomed" ; "mixed case")]
    fn test_alias_resolution_is_case_insensitive(alias: &str) {
        assert_eq!(resolve_system(alias), "http://snomed.info/sct");
    }

    #[test]
    fn test_full_uri_passes_through() {
        assert_eq!(resolve_system("http://snomed.info/sct"), "http://snomed.info/sct");
    }

    #[test]
    fn test_unknown_alias_passes_through_verbatim() {
        assert_eq!(resolve_system("MyLocalSystem"), "MyLocalSystem");
    }

    #[test]
    fn test_known_aliases_lists_all() {
        assert_eq!(known_aliases().count(), 8);
        assert!(known_aliases().any(|(alias, _)| alias == "ucum"));
    }
}
