const LEGAL_SUFFIXES: &[&str] = &[
    "llc",
    "inc",
    "corp",
    "ltd",
    "co",
    "company",
    "corporation",
    "limited",
];

/// Canonical comparison form of a company name.
///
/// Lowercases, strips anything that is not alphanumeric inside each word, drops legal-entity
/// suffixes as whole words and collapses whitespace. `"Acme Aviation, L.L.C."` and
/// `"ACME AVIATION"` both become `"acme aviation"`.
pub fn normalize_name(value: &str) -> String {
    name_tokens(value).join(" ")
}

/// Tokens of the canonical form, in their original order.
pub fn name_tokens(value: &str) -> Vec<String> {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty() && !LEGAL_SUFFIXES.contains(&token.as_str()))
        .collect()
}

/// Certificate numbers compare without punctuation or case.
pub fn normalize_certificate(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
