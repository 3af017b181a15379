use super::api::NutrientProfile;

const fn p(kcal: f64, protein: f64, carbs: f64, fat: f64, fiber: f64) -> NutrientProfile {
    NutrientProfile::new(kcal, protein, carbs, fat, fiber)
}

/// Used for ingredients no source knows, scaled by the raw amount.
pub const DEFAULT_ESTIMATE: NutrientProfile = p(50.0, 2.0, 10.0, 1.0, 1.0);

/// Common vegan staples, per 100 g. Order matters: the first matching key wins.
const TABLE: &[(&str, NutrientProfile)] = &[
    // Getreide & Mehl
    ("mehl", p(364.0, 10.0, 76.0, 1.0, 3.0)),
    ("weizenmehl", p(364.0, 10.0, 76.0, 1.0, 3.0)),
    ("dinkelmehl", p(338.0, 15.0, 70.0, 2.0, 9.0)),
    ("vollkornmehl", p(340.0, 13.0, 72.0, 2.0, 10.0)),
    ("haferflocken", p(379.0, 13.0, 58.0, 7.0, 10.0)),
    ("reis", p(130.0, 3.0, 28.0, 0.0, 0.0)),
    ("nudeln", p(371.0, 13.0, 74.0, 1.0, 3.0)),
    ("pasta", p(371.0, 13.0, 74.0, 1.0, 3.0)),
    ("brot", p(265.0, 9.0, 49.0, 3.0, 4.0)),
    // Hülsenfrüchte
    ("linsen", p(116.0, 9.0, 20.0, 0.0, 8.0)),
    ("kichererbsen", p(164.0, 9.0, 27.0, 3.0, 7.0)),
    ("bohnen", p(127.0, 9.0, 23.0, 0.0, 7.0)),
    ("kidneybohnen", p(127.0, 9.0, 23.0, 0.0, 7.0)),
    ("schwarze bohnen", p(132.0, 9.0, 24.0, 1.0, 9.0)),
    ("erbsen", p(81.0, 5.0, 14.0, 0.0, 5.0)),
    ("tofu", p(76.0, 8.0, 2.0, 5.0, 1.0)),
    ("räuchertofu", p(150.0, 15.0, 3.0, 9.0, 2.0)),
    ("tempeh", p(193.0, 19.0, 9.0, 11.0, 9.0)),
    // Gemüse
    ("tomate", p(18.0, 1.0, 4.0, 0.0, 1.0)),
    ("tomaten", p(18.0, 1.0, 4.0, 0.0, 1.0)),
    ("zwiebel", p(40.0, 1.0, 9.0, 0.0, 2.0)),
    ("zwiebeln", p(40.0, 1.0, 9.0, 0.0, 2.0)),
    ("knoblauch", p(149.0, 6.0, 33.0, 1.0, 2.0)),
    ("karotte", p(41.0, 1.0, 10.0, 0.0, 3.0)),
    ("karotten", p(41.0, 1.0, 10.0, 0.0, 3.0)),
    ("möhre", p(41.0, 1.0, 10.0, 0.0, 3.0)),
    ("möhren", p(41.0, 1.0, 10.0, 0.0, 3.0)),
    ("paprika", p(31.0, 1.0, 6.0, 0.0, 2.0)),
    ("zucchini", p(17.0, 1.0, 3.0, 0.0, 1.0)),
    ("aubergine", p(25.0, 1.0, 6.0, 0.0, 3.0)),
    ("brokkoli", p(34.0, 3.0, 7.0, 0.0, 3.0)),
    ("blumenkohl", p(25.0, 2.0, 5.0, 0.0, 2.0)),
    ("spinat", p(23.0, 3.0, 4.0, 0.0, 2.0)),
    ("salat", p(15.0, 1.0, 3.0, 0.0, 1.0)),
    ("gurke", p(15.0, 1.0, 4.0, 0.0, 1.0)),
    ("lauch", p(61.0, 1.0, 14.0, 0.0, 2.0)),
    // Nüsse & Samen
    ("mandel", p(579.0, 21.0, 22.0, 50.0, 12.0)),
    ("mandeln", p(579.0, 21.0, 22.0, 50.0, 12.0)),
    ("walnuss", p(654.0, 15.0, 14.0, 65.0, 7.0)),
    ("walnüsse", p(654.0, 15.0, 14.0, 65.0, 7.0)),
    ("cashew", p(553.0, 18.0, 30.0, 44.0, 3.0)),
    ("cashews", p(553.0, 18.0, 30.0, 44.0, 3.0)),
    ("erdnuss", p(567.0, 26.0, 16.0, 49.0, 8.0)),
    ("erdnüsse", p(567.0, 26.0, 16.0, 49.0, 8.0)),
    ("sonnenblumenkerne", p(584.0, 21.0, 20.0, 51.0, 9.0)),
    ("kürbiskerne", p(559.0, 30.0, 11.0, 49.0, 6.0)),
    ("sesam", p(573.0, 18.0, 23.0, 50.0, 12.0)),
    ("leinsamen", p(534.0, 18.0, 29.0, 42.0, 27.0)),
    ("chiasamen", p(486.0, 17.0, 42.0, 31.0, 34.0)),
    // Öle & Fette
    ("öl", p(884.0, 0.0, 0.0, 100.0, 0.0)),
    ("olivenöl", p(884.0, 0.0, 0.0, 100.0, 0.0)),
    ("rapsöl", p(884.0, 0.0, 0.0, 100.0, 0.0)),
    ("sonnenblumenöl", p(884.0, 0.0, 0.0, 100.0, 0.0)),
    ("kokosöl", p(862.0, 0.0, 0.0, 100.0, 0.0)),
    // Milchalternativen
    ("hafermilch", p(47.0, 1.0, 7.0, 2.0, 1.0)),
    ("sojamilch", p(54.0, 3.0, 6.0, 2.0, 1.0)),
    ("mandelmilch", p(24.0, 1.0, 3.0, 1.0, 0.0)),
    ("kokosmilch", p(230.0, 2.0, 6.0, 24.0, 2.0)),
    // Süßungsmittel
    ("zucker", p(387.0, 0.0, 100.0, 0.0, 0.0)),
    ("ahornsirup", p(260.0, 0.0, 67.0, 0.0, 0.0)),
    ("agavendicksaft", p(310.0, 0.0, 76.0, 0.0, 0.0)),
    ("honig", p(304.0, 0.0, 82.0, 0.0, 0.0)),
    // Gewürze & Würze
    ("salz", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("pfeffer", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("paprikapulver", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("curry", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("kurkuma", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("kreuzkümmel", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("zimt", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("muskat", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("ingwer", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("petersilie", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("basilikum", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("oregano", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("thymian", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("rosmarin", p(0.0, 0.0, 0.0, 0.0, 0.0)),
    ("sojasauce", p(53.0, 5.0, 5.0, 0.0, 0.0)),
    ("essig", p(19.0, 0.0, 1.0, 0.0, 0.0)),
    ("senf", p(66.0, 4.0, 6.0, 3.0, 3.0)),
    ("tomatenmark", p(82.0, 4.0, 18.0, 0.0, 3.0)),
    // Kartoffeln & Stärke
    ("kartoffel", p(77.0, 2.0, 17.0, 0.0, 2.0)),
    ("kartoffeln", p(77.0, 2.0, 17.0, 0.0, 2.0)),
    ("süßkartoffel", p(86.0, 2.0, 20.0, 0.0, 3.0)),
    ("süßkartoffeln", p(86.0, 2.0, 20.0, 0.0, 3.0)),
    ("stärke", p(381.0, 0.0, 91.0, 0.0, 0.0)),
    ("maisstärke", p(381.0, 0.0, 91.0, 0.0, 0.0)),
    // Obst
    ("apfel", p(52.0, 0.0, 14.0, 0.0, 2.0)),
    ("banane", p(89.0, 1.0, 23.0, 0.0, 3.0)),
    ("orange", p(47.0, 1.0, 12.0, 0.0, 2.0)),
    ("zitrone", p(29.0, 1.0, 9.0, 0.0, 3.0)),
    ("beeren", p(57.0, 1.0, 14.0, 0.0, 2.0)),
    ("erdbeeren", p(32.0, 1.0, 8.0, 0.0, 2.0)),
    ("heidelbeeren", p(57.0, 1.0, 14.0, 0.0, 2.0)),
    ("himbeeren", p(52.0, 1.0, 12.0, 1.0, 7.0)),
    ("mango", p(60.0, 1.0, 15.0, 0.0, 2.0)),
    ("ananas", p(50.0, 1.0, 13.0, 0.0, 1.0)),
    ("avocado", p(160.0, 2.0, 9.0, 15.0, 7.0)),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNutritionTable;

impl LocalNutritionTable {
    /// First entry whose key is part of the name, or whose key contains the
    /// whole name.
    pub fn lookup(&self, name: &str) -> Option<(&'static str, NutrientProfile)> {
        let name_lower = name.trim().to_lowercase();
        if name_lower.is_empty() {
            return None;
        }
        TABLE
            .iter()
            .find(|(key, _)| name_lower.contains(key) || key.contains(name_lower.as_str()))
            .map(|(key, profile)| (*key, *profile))
    }

    pub fn len(&self) -> usize {
        TABLE.len()
    }

    pub fn is_empty(&self) -> bool {
        TABLE.is_empty()
    }
}
