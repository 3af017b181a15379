use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d+)?").unwrap();
}

/// Parses a recipe amount such as `"200"`, `"1,5"`, `"1-2"`, `"1/2"` or
/// `"ca. 3"`. Returns `None` for anything that does not yield a positive
/// quantity.
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<&str> = text.split('-').collect();
    let value = if parts.len() == 2 && !text.starts_with('-') {
        match (parse_number(parts[0]), parse_number(parts[1])) {
            (Some(low), Some(high)) => (low + high) / 2.0,
            _ => first_number(parts[0])?,
        }
    } else if text.contains('/') {
        parse_fraction(text).or_else(|| first_number(text))?
    } else {
        parse_number(text).or_else(|| first_number(text))?
    };

    (value > 0.0).then_some(value)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

fn first_number(text: &str) -> Option<f64> {
    FIRST_NUMBER.find(text).and_then(|m| parse_number(m.as_str()))
}

/// `"1/2"` and mixed numbers like `"1 1/2"`.
fn parse_fraction(text: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in text.split_whitespace() {
        total += match part.split_once('/') {
            Some((num, den)) => {
                let den = parse_number(den)?;
                if den == 0.0 {
                    return None;
                }
                parse_number(num)? / den
            }
            None => parse_number(part)?,
        };
    }
    Some(total)
}

/// Result of converting an amount and unit into grams (or millilitres,
/// which are treated as grams).
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub grams: f64,
    pub note: Option<String>,
    /// The unit was not understood and the amount was taken as grams.
    pub assumed_grams: bool,
}

impl Conversion {
    fn exact(grams: f64) -> Self {
        Self {
            grams,
            note: None,
            assumed_grams: false,
        }
    }

    fn estimated(amount: f64, per_unit: f64, label: &str) -> Self {
        let grams = amount * per_unit;
        Self {
            grams,
            note: Some(format!("{} {} = ~{}g", format_quantity(amount), label, format_quantity(grams))),
            assumed_grams: false,
        }
    }

    fn assumed(amount: f64, unit: &str) -> Self {
        Self {
            grams: amount,
            note: Some(format!(
                "unknown unit '{}', assuming {}g",
                unit,
                format_quantity(amount)
            )),
            assumed_grams: true,
        }
    }
}

const NEGLIGIBLE_UNITS: &[&str] = &[
    "prise",
    "prisen",
    "spritzer",
    "schuss",
    "etwas",
    "wenig",
    "nach belieben",
    "nach geschmack",
    "belieben",
    "geschmack",
];

pub fn grams_for(amount: f64, unit: &str, name: &str) -> Conversion {
    let unit_lower = unit.trim().to_lowercase();
    let name_lower = name.to_lowercase();
    let has = |needle: &str| name_lower.contains(needle);

    match unit_lower.as_str() {
        "kg" | "kilo" | "kilogramm" => Conversion::exact(amount * 1000.0),
        "mg" | "milligramm" => Conversion::exact(amount / 1000.0),
        "g" | "gramm" | "gr" => Conversion::exact(amount),
        "ml" | "milliliter" => Conversion::exact(amount),
        "l" | "liter" => Conversion::exact(amount * 1000.0),
        "cl" | "centiliter" => Conversion::exact(amount * 10.0),
        "dl" | "deciliter" => Conversion::exact(amount * 100.0),

        "el" | "esslöffel" | "essl" | "eßlöffel" | "tbsp" | "essloffel" => {
            Conversion::estimated(amount, 15.0, "EL")
        }
        "tl" | "teelöffel" | "teel" | "tsp" | "teeloffel" => Conversion::estimated(amount, 5.0, "TL"),
        "msp" | "messerspitze" | "messerspitzen" => Conversion::estimated(amount, 2.0, "Msp"),
        "tasse" | "tassen" | "cup" | "cups" | "becher" => Conversion::estimated(amount, 240.0, "Tasse(n)"),

        u if NEGLIGIBLE_UNITS.contains(&u) => Conversion {
            grams: 0.0,
            note: Some(format!("{} {} is negligible", format_quantity(amount), unit.trim())),
            assumed_grams: false,
        },
        "handvoll" | "hand voll" => Conversion::estimated(amount, 40.0, "Handvoll"),

        "dose" | "dosen" => Conversion::estimated(amount, 400.0, "Dose(n)"),
        "glas" | "gläser" => Conversion::estimated(amount, 200.0, "Glas"),
        "packung" | "pkg" | "pack" => Conversion::estimated(amount, 250.0, "Packung(en)"),
        "bund" | "bündel" => Conversion::estimated(amount, 100.0, "Bund"),

        "scheibe" | "scheiben" => {
            if has("brot") || has("toast") {
                Conversion::estimated(amount, 30.0, "Scheibe(n) Brot")
            } else if has("käse") || has("wurst") {
                Conversion::estimated(amount, 20.0, "Scheibe(n)")
            } else {
                Conversion::estimated(amount, 25.0, "Scheibe(n)")
            }
        }
        "würfel" => {
            if has("hefe") {
                Conversion::estimated(amount, 42.0, "Würfel Hefe")
            } else {
                Conversion::estimated(amount, 10.0, "Würfel")
            }
        }
        "riegel" => Conversion::estimated(amount, 100.0, "Riegel"),
        "blatt" | "blätter" => Conversion::estimated(amount, 1.0, "Blatt/Blätter"),
        "stange" | "stangen" => {
            if has("lauch") || has("porree") {
                Conversion::estimated(amount, 150.0, "Stange(n) Lauch")
            } else if has("sellerie") {
                Conversion::estimated(amount, 40.0, "Stange(n) Sellerie")
            } else {
                Conversion::estimated(amount, 100.0, "Stange(n)")
            }
        }
        "knolle" | "knollen" => {
            if has("knoblauch") {
                Conversion::estimated(amount, 40.0, "Knolle(n) Knoblauch")
            } else if has("ingwer") {
                Conversion::estimated(amount, 50.0, "Knolle(n) Ingwer")
            } else {
                Conversion::estimated(amount, 100.0, "Knolle(n)")
            }
        }
        "kopf" | "köpfe" => {
            if has("salat") {
                Conversion::estimated(amount, 200.0, "Kopf Salat")
            } else if has("kohl") {
                Conversion::estimated(amount, 600.0, "Kopf Kohl")
            } else {
                Conversion::estimated(amount, 300.0, "Kopf")
            }
        }

        "pfund" => Conversion::estimated(amount, 500.0, "Pfund"),
        "oz" | "unze" | "unzen" | "ounce" => Conversion::estimated(amount, 28.35, "oz"),
        "lb" | "pound" | "pounds" => Conversion::estimated(amount, 453.6, "lb"),

        "stück" | "stk" | "st" | "x" | "" => piece_weight(amount, &name_lower)
            .unwrap_or_else(|| Conversion::assumed(amount, unit.trim())),

        _ => Conversion::assumed(amount, unit.trim()),
    }
}

fn piece_weight(amount: f64, name_lower: &str) -> Option<Conversion> {
    let is_egg = name_lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "ei" || word == "eier");

    let conversion = if name_lower.contains("kartoffel") {
        Conversion::estimated(amount, 150.0, "Kartoffel(n)")
    } else if name_lower.contains("zwiebel") {
        Conversion::estimated(amount, 100.0, "Zwiebel(n)")
    } else if name_lower.contains("knoblauch") || name_lower.contains("zehe") {
        Conversion::estimated(amount, 5.0, "Zehe(n)")
    } else if name_lower.contains("tomate") {
        Conversion::estimated(amount, 150.0, "Tomate(n)")
    } else if name_lower.contains("paprika") {
        Conversion::estimated(amount, 180.0, "Paprika")
    } else if is_egg {
        Conversion::estimated(amount, 60.0, "Ei(er)")
    } else {
        return None;
    };
    Some(conversion)
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}
