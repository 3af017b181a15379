/// Builds the URL slug the website uses for `/rezept/<slug>`.
pub fn slugify(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss");

    let dashed: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    dashed
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_umlauts_and_punctuation() {
        assert_eq!(slugify("Käsespätzle (vegan)!"), "kaesespaetzle-vegan");
        assert_eq!(slugify("Süßkartoffel-Curry  mit Reis"), "suesskartoffel-curry-mit-reis");
        assert_eq!(slugify("ÖL & Essig"), "oel-essig");
    }

    #[test]
    fn test_empty_and_symbols_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("--- ?! ---"), "");
    }
}
