use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_LANGUAGE_CODE: &str = "en";

pub const DEFAULT_TERMINATORS: &[char] = &[
    '.', '。', ',', '，', '?', '？', '!', '！', ';', '；', '—', '、', '\n', '\r',
];
pub const DEFAULT_OPEN_PARENS: &[char] = &['(', '（', '[', '【', '「', '『', '《', '〈'];
pub const DEFAULT_CLOSE_PARENS: &[char] = &[')', '）', ']', '】', '」', '』', '》', '〉'];
pub const DEFAULT_QUOTES: &[char] = &['"', '“', '”', '\'', '‘', '’', '«', '»'];

const ARABIC_TERMINATORS: &[char] = &[
    '.', ',', '،', '?', '؟', '!', ';', '؛', '—', '\n', '\r',
];

const LATIN_CLASS: &str = r"\p{Latin}";

#[derive(Debug, Clone)]
pub struct LanguageProfile {
    code: String,
    name: String,
    min_word_length: usize,
    terminators: Vec<char>,
    open_parens: Vec<char>,
    close_parens: Vec<char>,
    quotes: Vec<char>,
    letter: Regex,
    word: Regex,
}

impl LanguageProfile {
    pub fn new(
        code: &str,
        name: &str,
        letter_class: &str,
        min_word_length: usize,
    ) -> Result<Self, regex::Error> {
        Self::with_delimiters(
            code,
            name,
            letter_class,
            min_word_length,
            DEFAULT_TERMINATORS,
            DEFAULT_OPEN_PARENS,
            DEFAULT_CLOSE_PARENS,
            DEFAULT_QUOTES,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_delimiters(
        code: &str,
        name: &str,
        letter_class: &str,
        min_word_length: usize,
        terminators: &[char],
        open_parens: &[char],
        close_parens: &[char],
        quotes: &[char],
    ) -> Result<Self, regex::Error> {
        let min_word_length = min_word_length.max(1);
        let letter = Regex::new(&format!("^(?:{letter_class})$"))?;
        let word = Regex::new(&format!("(?:{letter_class}){{{min_word_length},}}"))?;
        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
            min_word_length,
            terminators: terminators.to_vec(),
            open_parens: open_parens.to_vec(),
            close_parens: close_parens.to_vec(),
            quotes: quotes.to_vec(),
            letter,
            word,
        })
    }

    pub fn for_code(code: &str) -> Option<&'static LanguageProfile> {
        let canonical = normalize_language_code(code);
        BUILTIN_PROFILES
            .iter()
            .find(|profile| profile.code == canonical)
    }

    pub fn fallback() -> &'static LanguageProfile {
        Self::for_code(DEFAULT_LANGUAGE_CODE).unwrap_or(&BUILTIN_PROFILES[0])
    }

    pub fn builtin() -> &'static [LanguageProfile] {
        &BUILTIN_PROFILES
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    pub fn is_letter(&self, ch: char) -> bool {
        let mut buf = [0_u8; 4];
        self.letter.is_match(ch.encode_utf8(&mut buf))
    }

    pub fn is_terminator(&self, ch: char) -> bool {
        self.terminators.contains(&ch)
    }

    pub fn is_open_paren(&self, ch: char) -> bool {
        self.open_parens.contains(&ch)
    }

    pub fn is_close_paren(&self, ch: char) -> bool {
        self.close_parens.contains(&ch)
    }

    pub fn is_quote(&self, ch: char) -> bool {
        self.quotes.contains(&ch)
    }

    pub(crate) fn word_regex(&self) -> &Regex {
        &self.word
    }
}

pub fn normalize_language_code(language_code: &str) -> String {
    let normalized = language_code.trim().to_lowercase().replace('_', "-");
    match normalized.as_str() {
        "" | "auto" => DEFAULT_LANGUAGE_CODE.to_string(),
        "en" | "eng" | "english" | "en-us" | "en-gb" => "en".to_string(),
        "zh" | "zh-cn" | "zh-hans" | "zh-tw" | "zh-hant" | "cn" | "chinese" | "zho" => {
            "zh".to_string()
        }
        "ja" | "jp" | "jpn" | "japanese" => "ja".to_string(),
        "ko" | "kor" | "korean" => "ko".to_string(),
        "ar" | "ara" | "arabic" => "ar".to_string(),
        "ru" | "rus" | "russian" => "ru".to_string(),
        "uk" | "ukr" | "ukrainian" => "uk".to_string(),
        "fr" | "fra" | "french" => "fr".to_string(),
        "es" | "spa" | "spanish" => "es".to_string(),
        "it" | "ita" | "italian" => "it".to_string(),
        "pt" | "por" | "portuguese" | "pt-br" => "pt".to_string(),
        "de" | "deu" | "german" => "de".to_string(),
        "nl" | "nld" | "dutch" => "nl".to_string(),
        _ => normalized,
    }
}

pub fn language_name(language_code: &str) -> String {
    LanguageProfile::for_code(language_code)
        .map(|profile| profile.name().to_string())
        .unwrap_or_else(|| language_code.trim().to_string())
}

static BUILTIN_PROFILES: Lazy<Vec<LanguageProfile>> = Lazy::new(|| {
    let table: [(&str, &str, &str, usize); 13] = [
        ("en", "English", LATIN_CLASS, 4),
        ("de", "German", LATIN_CLASS, 4),
        ("nl", "Dutch", LATIN_CLASS, 4),
        ("fr", "French", LATIN_CLASS, 3),
        ("es", "Spanish", LATIN_CLASS, 3),
        ("it", "Italian", LATIN_CLASS, 3),
        ("pt", "Portuguese", LATIN_CLASS, 3),
        ("ru", "Russian", r"\p{Cyrillic}", 3),
        ("uk", "Ukrainian", r"\p{Cyrillic}", 3),
        ("zh", "Chinese", r"\p{Han}", 2),
        ("ja", "Japanese", r"[\p{Hiragana}\p{Katakana}\p{Han}ー]", 2),
        ("ko", "Korean", r"\p{Hangul}", 2),
        ("ar", "Arabic", r"\p{Arabic}", 3),
    ];

    table
        .iter()
        .filter_map(|(code, name, class, min_len)| {
            let built = if *code == "ar" {
                LanguageProfile::with_delimiters(
                    code,
                    name,
                    class,
                    *min_len,
                    ARABIC_TERMINATORS,
                    DEFAULT_OPEN_PARENS,
                    DEFAULT_CLOSE_PARENS,
                    DEFAULT_QUOTES,
                )
            } else {
                LanguageProfile::new(code, name, class, *min_len)
            };
            match built {
                Ok(profile) => Some(profile),
                Err(err) => {
                    tracing::error!(code, "failed to compile built-in language profile: {err}");
                    None
                }
            }
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_word_length_table_is_preserved() {
        let expected = [
            ("zh", 2),
            ("ja", 2),
            ("ko", 2),
            ("ar", 3),
            ("ru", 3),
            ("fr", 3),
            ("es", 3),
            ("en", 4),
            ("de", 4),
        ];
        for (code, min_len) in expected {
            let profile = LanguageProfile::for_code(code).expect("built-in profile");
            assert_eq!(profile.min_word_length(), min_len, "profile {code}");
        }
    }

    #[test]
    fn aliases_resolve_to_builtin_profiles() {
        assert_eq!(LanguageProfile::for_code("zh_CN").map(|p| p.code()), Some("zh"));
        assert_eq!(LanguageProfile::for_code("English").map(|p| p.code()), Some("en"));
        assert!(LanguageProfile::for_code("tlh").is_none());
        assert_eq!(LanguageProfile::fallback().code(), "en");
    }

    #[test]
    fn letter_class_matches_single_characters() {
        let zh = LanguageProfile::for_code("zh").expect("zh profile");
        assert!(zh.is_letter('好'));
        assert!(!zh.is_letter('a'));
        assert!(!zh.is_letter('。'));

        let ru = LanguageProfile::for_code("ru").expect("ru profile");
        assert!(ru.is_letter('ж'));
        assert!(!ru.is_letter('z'));
    }

    #[test]
    fn invalid_letter_class_is_rejected() {
        assert!(LanguageProfile::new("xx", "Broken", r"\p{NotAScript}", 3).is_err());
    }

    #[test]
    fn language_name_falls_back_to_code() {
        assert_eq!(language_name("zho"), "Chinese");
        assert_eq!(language_name("tlh"), "tlh");
    }
}
