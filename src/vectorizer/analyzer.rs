use std::sync::{Arc, OnceLock};

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// Text -> term sequence capability.
///
/// Injected into `TfIdfModel` at construction and used for both `fit` and `transform`.
/// Implementations must be pure and deterministic.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<String>;
}

impl<A> Analyzer for Arc<A>
where
    A: Analyzer + ?Sized,
{
    #[inline]
    fn analyze(&self, text: &str) -> Vec<String> {
        (**self).analyze(text)
    }
}

/// Adapter to use a plain function or closure as an `Analyzer`
#[derive(Clone, Copy)]
pub struct FnAnalyzer<F>(pub F);

impl<F> Analyzer for FnAnalyzer<F>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    #[inline]
    fn analyze(&self, text: &str) -> Vec<String> {
        (self.0)(text)
    }
}

/// Lowercase + whitespace split, nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(|s| s.to_lowercase()).collect()
    }
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex pattern"))
}

/// `@handle` mentions, capture group 1 is the handle
pub(crate) fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"@(\S+)")
}

pub(crate) fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"http\S+")
}

fn dash_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"—|’’|’|-|”|“|‘")
}

fn digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\d+")
}

/// word runs and symbol runs, split apart
fn word_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\w+|[^\w\s]+")
}

/// English stopwords
pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// closed-class words outside the stopword list (determiners, modals, conjunctions, pronouns)
pub const FUNCTION_WORDS: &[&str] = &[
    "would", "could", "might", "must", "shall", "may", "ought", "upon", "among", "amongst",
    "via", "per", "onto", "within", "without", "toward", "towards", "across", "along", "around",
    "behind", "beside", "besides", "beyond", "despite", "though", "although", "unless",
    "whether", "whereas", "yet", "either", "neither", "every", "another", "many", "much",
    "several", "anyone", "everyone", "someone", "nobody", "everything", "something", "anything",
    "nothing", "us", "one", "ones", "also", "let",
];

/// Tweet text normalizer, the default analyzer
///
/// 1. strip links and `@mentions`
/// 2. lowercase, dashes and curly quotes become spaces
/// 3. drop digits and ASCII punctuation
/// 4. split into word and symbol runs
/// 5. drop stopwords, function words and symbol-only runs
/// 6. stem, then drop stems that are stopwords
pub struct TweetAnalyzer {
    stemmer: Stemmer,
}

impl Default for TweetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TweetAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TweetAnalyzer")
    }
}

impl TweetAnalyzer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Steps 1-4, no filtering
    pub fn filter(&self, text: &str) -> Vec<String> {
        let text = link_re().replace_all(text, "");
        let text = mention_re().replace_all(&text, "");
        let text = text.to_lowercase();
        let text = dash_quote_re().replace_all(&text, " ");
        let text = digit_re().replace_all(text.trim(), "");
        let text: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        word_punct_re()
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    #[inline]
    fn is_stop_word(word: &str) -> bool {
        STOP_WORDS.contains(&word)
    }

    #[inline]
    fn is_function_word(word: &str) -> bool {
        FUNCTION_WORDS.contains(&word) || !word.chars().any(char::is_alphanumeric)
    }
}

impl Analyzer for TweetAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        // 一回の前進走査で新しい列を作る
        self.filter(text)
            .into_iter()
            .filter(|w| !Self::is_stop_word(w) && !Self::is_function_word(w))
            .map(|w| self.stemmer.stem(&w).into_owned())
            .filter(|stem| !stem.is_empty() && !Self::is_stop_word(stem))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_links_mentions_digits_punctuation() {
        let a = TweetAnalyzer::new();
        let toks = a.filter("Check https://t.co/xyz @NASA 2020 launch! Mars-rover “ready”");
        assert_eq!(toks, vec!["check", "launch", "mars", "rover", "ready"]);
    }

    #[test]
    fn drops_stopwords_and_stems() {
        let a = TweetAnalyzer::new();
        let toks = a.analyze("The scientists are running new experiments on the rovers");
        assert_eq!(toks, vec!["scientist", "run", "new", "experi", "rover"]);
    }

    #[test]
    fn duplicates_survive_filtering() {
        // every occurrence is kept, none skipped
        let a = TweetAnalyzer::new();
        let toks = a.analyze("vote vote the vote");
        assert_eq!(toks, vec!["vote", "vote", "vote"]);
    }

    #[test]
    fn empty_and_noise_only_text() {
        let a = TweetAnalyzer::new();
        assert!(a.analyze("").is_empty());
        assert!(a.analyze("   ").is_empty());
        assert!(a.analyze("@someone http://x.y 123 !!! the").is_empty());
    }

    #[test]
    fn deterministic() {
        let a = TweetAnalyzer::new();
        let text = "Vaccines approved today, Pfizer and BioNTech celebrate #covid19";
        assert_eq!(a.analyze(text), a.analyze(text));
    }

    #[test]
    fn adapters() {
        let w = WhitespaceAnalyzer;
        assert_eq!(w.analyze(" NASA  esa "), vec!["nasa", "esa"]);
        let f = FnAnalyzer(|s: &str| vec![s.len().to_string()]);
        assert_eq!(f.analyze("abc"), vec!["3"]);
        let shared: Arc<dyn Analyzer> = Arc::new(WhitespaceAnalyzer);
        assert_eq!(shared.analyze("A b"), vec!["a", "b"]);
    }
}
