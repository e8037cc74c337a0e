//! Rule-based English noun lemmatizer.
//!
//! Follows the WordNet morphy noun rules (`-ses`, `-xes`, `-zes`, `-ches`,
//! `-shes`, `-men`, `-ies`, `-s`) with an irregular-plural exception table.
//! There is no lexicon lookup, so the rules are guarded instead:
//!
//! - words of three characters or fewer are kept,
//! - anything that is not purely alphabetic is kept (multi-word strings,
//!   possessives, numbers, punctuation),
//! - `-ss`, `-us` and `-is` endings are kept (`glass`, `status`, `crisis`),
//! - a small set of invariant nouns ending in `s` is kept (`news`, `series`),
//! - singular words and names ending in `s` are kept (`texas`, `bias`,
//!   `jones`, `angeles`),
//! - `-ies` plurals of `-ie` nouns drop only the `s` (`movies`, `cookies`).
//!
//! Every output is a fixed point: lemmatizing a lemma returns it unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::Stemmer;

static IRREGULAR_PLURALS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("children", "child"),
        ("women", "woman"),
        ("men", "man"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("oxen", "ox"),
        ("lice", "louse"),
        ("dice", "die"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("lives", "life"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("thieves", "thief"),
        ("wolves", "wolf"),
        ("shelves", "shelf"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("crises", "crisis"),
        ("analyses", "analysis"),
        ("theses", "thesis"),
        ("hypotheses", "hypothesis"),
        ("indices", "index"),
    ]
    .into_iter()
    .collect()
});

static INVARIANT_NOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "news",
        "series",
        "species",
        "politics",
        "economics",
        "physics",
        "mathematics",
        "ethics",
        "athletics",
        "means",
        "headquarters",
        "whereabouts",
        "jeans",
        "pants",
        "scissors",
        "clothes",
        "sales",
        "always",
        "perhaps",
        "sometimes",
        "towards",
        "afterwards",
        "besides",
        "unless",
        "yes",
    ]
    .into_iter()
    .collect()
});

/// Singular words ending in `s` that the `-s` and `-es` rules would damage.
static SINGULAR_S_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // -as
        "texas", "kansas", "arkansas", "vegas", "dallas", "douglas", "thomas", "nicholas",
        "lucas", "hamas", "bias", "atlas", "canvas", "alias", "christmas", "pancreas", "whereas",
        "madras",
        // -es
        "jones", "angeles", "james", "charles", "reyes", "hughes", "mercedes", "hermes",
        "diabetes", "herpes", "rabies", "achilles", "socrates", "euphrates", "andes", "wales",
        "measles", "mumps", "hades",
        // -os and others
        "chaos", "ethos", "pathos", "cosmos", "kudos", "asbestos", "carlos", "santos", "lens",
        "debris", "brussels", "mars",
    ]
    .into_iter()
    .collect()
});

/// Nouns ending in `ie` whose plural would otherwise become `-y`.
static IE_NOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "movie", "cookie", "zombie", "rookie", "selfie", "hippie", "calorie", "brownie",
        "prairie", "genie", "goalie", "smoothie", "veggie", "aussie", "newbie", "freebie",
        "hoodie", "sweetie", "auntie", "birdie", "pixie", "yuppie", "bookie", "techie", "foodie",
        "junkie", "hottie", "cutie", "budgie", "collie", "magpie", "necktie", "lassie",
        "sortie", "coterie", "lingerie", "rotisserie", "menagerie", "reverie", "boogie",
    ]
    .into_iter()
    .collect()
});

/// Words ending in `men` that are not plurals of `-man`.
static SINGULAR_MEN: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "specimen", "abdomen", "regimen", "omen", "amen", "semen", "hymen", "acumen", "stamen",
        "yemen",
    ]
    .into_iter()
    .collect()
});

/// Noun lemmatizer reducing plural forms to their singular.
#[derive(Debug, Clone, Default)]
pub struct NounLemmatizer;

impl NounLemmatizer {
    /// Create a new noun lemmatizer.
    pub fn new() -> Self {
        NounLemmatizer
    }

    /// Lemmatize a single word, returning `None` when no rule applies.
    fn reduce(word: &str) -> Option<String> {
        if let Some(&lemma) = IRREGULAR_PLURALS.get(word) {
            return Some(lemma.to_string());
        }

        if word.chars().count() <= 3
            || INVARIANT_NOUNS.contains(word)
            || SINGULAR_S_WORDS.contains(word)
        {
            return None;
        }

        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return None;
        }

        if let Some(stem) = word.strip_suffix("men") {
            if word.len() > 5 && !SINGULAR_MEN.contains(word) {
                return Some(format!("{stem}man"));
            }
            return None;
        }

        if let Some(stem) = word.strip_suffix("ies") {
            let singular_ie = &word[..word.len() - 1];
            // "lies", "ties", "pies" keep the `ie`.
            return if stem.chars().count() < 2 || IE_NOUNS.contains(singular_ie) {
                Some(singular_ie.to_string())
            } else {
                Some(format!("{stem}y"))
            };
        }

        for suffix in ["sses", "xes", "zzes", "ches", "shes"] {
            if word.ends_with(suffix) {
                return Some(word[..word.len() - 2].to_string());
            }
        }

        word.strip_suffix('s').map(str::to_string)
    }
}

impl Stemmer for NounLemmatizer {
    fn stem(&self, word: &str) -> String {
        if word.is_empty() || !word.chars().all(char::is_alphabetic) {
            return word.to_string();
        }
        Self::reduce(word).unwrap_or_else(|| word.to_string())
    }

    fn name(&self) -> &'static str {
        "noun_lemmatizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(word: &str) -> String {
        NounLemmatizer::new().stem(word)
    }

    #[test]
    fn test_regular_plurals() {
        assert_eq!(lemma("senators"), "senator");
        assert_eq!(lemma("elections"), "election");
        assert_eq!(lemma("houses"), "house");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("churches"), "church");
        assert_eq!(lemma("wishes"), "wish");
        assert_eq!(lemma("glasses"), "glass");
        assert_eq!(lemma("buzzes"), "buzz");
    }

    #[test]
    fn test_ies_and_men() {
        assert_eq!(lemma("countries"), "country");
        assert_eq!(lemma("flies"), "fly");
        assert_eq!(lemma("lies"), "lie");
        assert_eq!(lemma("congressmen"), "congressman");
        assert_eq!(lemma("specimen"), "specimen");
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(lemma("children"), "child");
        assert_eq!(lemma("women"), "woman");
        assert_eq!(lemma("men"), "man");
        assert_eq!(lemma("crises"), "crisis");
    }

    #[test]
    fn test_guards_keep_word() {
        assert_eq!(lemma("gas"), "gas");
        assert_eq!(lemma("status"), "status");
        assert_eq!(lemma("crisis"), "crisis");
        assert_eq!(lemma("class"), "class");
        assert_eq!(lemma("news"), "news");
        assert_eq!(lemma("trump's"), "trump's");
        assert_eq!(lemma("2016s"), "2016s");
        assert_eq!(lemma(""), "");
    }

    #[test]
    fn test_singular_words_ending_in_s() {
        for word in [
            "texas", "bias", "atlas", "jones", "angeles", "james", "diabetes", "chaos", "lens",
        ] {
            assert_eq!(lemma(word), word);
        }
        assert_eq!(lemma("ideas"), "idea");
        assert_eq!(lemma("areas"), "area");
        assert_eq!(lemma("notes"), "note");
    }

    #[test]
    fn test_ie_nouns() {
        assert_eq!(lemma("movies"), "movie");
        assert_eq!(lemma("cookies"), "cookie");
        assert_eq!(lemma("zombies"), "zombie");
        assert_eq!(lemma("movie"), "movie");
        assert_eq!(lemma("parties"), "party");
        assert_eq!(lemma("stories"), "story");
    }

    #[test]
    fn test_multi_word_string_unchanged() {
        assert_eq!(lemma("good news today"), "good news today");
        assert_eq!(lemma("senators voted"), "senators voted");
    }

    #[test]
    fn test_lemmas_are_fixed_points() {
        for word in [
            "senators", "houses", "boxes", "countries", "lies", "congressmen", "children",
            "glasses", "wolves", "indices", "statuses", "movies", "texas", "cookies",
        ] {
            let once = lemma(word);
            assert_eq!(lemma(&once), once, "{word} -> {once}");
        }
    }
}
