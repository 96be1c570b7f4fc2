use std::{fs, path::{Path, PathBuf}};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::{Error, Result}, vectorizer::{analyzer::{link_re, mention_re, Analyzer}, term::TermFrequency}};

/// One record of a source collection, as scraped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTweet {
    pub user_name: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub date: String,
    pub text: String,
    /// `[null]` when the tweet carries no hashtag
    #[serde(default)]
    pub hashtags: Vec<Option<String>>,
}

/// A tokenized tweet
/// Built once by the parse pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub author: String,
    pub screen_name: String,
    pub timestamp: String,
    pub raw_text: String,
    pub tokens: Vec<String>,
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
    pub emojis: Vec<String>,
    pub links: Vec<String>,
}

impl Document {
    /// Tokenize and extract entities from a raw record
    pub fn from_raw<A: Analyzer + ?Sized>(id: &str, raw: &RawTweet, analyzer: &A) -> Self {
        Self {
            id: id.to_string(),
            author: raw.user_name.clone(),
            screen_name: raw.screen_name.clone(),
            timestamp: raw.date.clone(),
            raw_text: raw.text.clone(),
            tokens: analyzer.analyze(&raw.text),
            mentions: extract_mentions(&raw.text),
            hashtags: raw.hashtags.iter().flatten().cloned().collect(),
            emojis: extract_emojis(&raw.text),
            links: extract_links(&raw.text),
        }
    }
}

/// Handles mentioned as `@handle`, without the `@`
pub fn extract_mentions(text: &str) -> Vec<String> {
    mention_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn extract_links(text: &str) -> Vec<String> {
    link_re().find_iter(text).map(|m| m.as_str().to_string()).collect()
}

#[inline]
fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F1E6..=0x1F1FF   // regional indicators
        | 0x1F300..=0x1F5FF // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF
        | 0x2600..=0x26FF   // misc symbols
        | 0x2700..=0x27BF   // dingbats
    )
}

pub fn extract_emojis(text: &str) -> Vec<String> {
    text.chars().filter(|c| is_emoji(*c)).map(String::from).collect()
}

/// Space-prefixed concatenation of handles, `" "` when there are none.
/// Never empty, so every text gets a well-defined mention vector.
pub fn mention_text<S: AsRef<str>>(handles: &[S]) -> String {
    if handles.is_empty() {
        return " ".to_string();
    }
    handles.iter().fold(String::new(), |mut acc, h| {
        acc.push(' ');
        acc.push_str(h.as_ref());
        acc
    })
}

/// Per-author counters, one map per entity kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub text: IndexMap<String, TermFrequency>,
    pub mentions: IndexMap<String, TermFrequency>,
    pub hashtags: IndexMap<String, TermFrequency>,
    pub links: IndexMap<String, TermFrequency>,
    pub emoji: IndexMap<String, TermFrequency>,
}

impl Frequency {
    /// Insert fresh counters for an author seen for the first time.
    /// Returns false if the author was already known.
    fn init_author(&mut self, author: &str) -> bool {
        if self.text.contains_key(author) {
            return false;
        }
        for map in [&mut self.text, &mut self.mentions, &mut self.hashtags, &mut self.links, &mut self.emoji] {
            map.insert(author.to_string(), TermFrequency::new());
        }
        true
    }

    fn record(&mut self, doc: &Document) {
        let author = doc.author.as_str();
        let pairs: [(&mut IndexMap<String, TermFrequency>, &[String]); 5] = [
            (&mut self.text, &doc.tokens),
            (&mut self.mentions, &doc.mentions),
            (&mut self.hashtags, &doc.hashtags),
            (&mut self.links, &doc.links),
            (&mut self.emoji, &doc.emojis),
        ];
        for (map, items) in pairs {
            if let Some(counter) = map.get_mut(author) {
                counter.add_terms(items);
            }
        }
    }
}

/// The parse-pass aggregate: every document grouped by author, plus the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCorpus {
    /// author -> tweet id -> document
    pub tweets: IndexMap<String, IndexMap<String, Document>>,
    pub frequency: Frequency,
}

impl ParsedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every source collection in order
    ///
    /// # Errors
    /// * `NoSourceCollections` - `sources` is empty
    /// * `SourceUnreadable` / `SourceMalformed` - a file can't be read or isn't tweet records
    pub fn parse<A, P>(sources: &[P], analyzer: &A) -> Result<Self>
    where
        A: Analyzer + ?Sized,
        P: AsRef<Path>,
    {
        if sources.is_empty() {
            return Err(Error::NoSourceCollections);
        }
        let mut parsed = Self::new();
        for path in sources {
            let records = read_source(path.as_ref())?;
            debug!(path = %path.as_ref().display(), records = records.len(), "parsing source collection");
            parsed.extend(&records, analyzer);
        }
        Ok(parsed)
    }

    /// Add records to the aggregate
    /// Tokenization runs in parallel, the counters are folded in record order.
    pub fn extend<A>(&mut self, records: &IndexMap<String, RawTweet>, analyzer: &A)
    where
        A: Analyzer + ?Sized,
    {
        let entries: Vec<(&String, &RawTweet)> = records.iter().collect();
        let docs: Vec<Document> = entries
            .par_iter()
            .map(|(id, raw)| Document::from_raw(id, raw, analyzer))
            .collect();
        for doc in docs {
            if self.frequency.init_author(&doc.author) {
                self.tweets.insert(doc.author.clone(), IndexMap::new());
            }
            self.frequency.record(&doc);
            if let Some(by_id) = self.tweets.get_mut(&doc.author) {
                by_id.insert(doc.id.clone(), doc);
            }
        }
    }

    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.tweets.keys().map(|s| s.as_str())
    }

    pub fn contains_author(&self, author: &str) -> bool {
        self.tweets.contains_key(author)
    }

    pub fn documents(&self, author: &str) -> impl Iterator<Item = &Document> {
        self.tweets.get(author).into_iter().flat_map(|m| m.values())
    }

    pub fn doc_num(&self) -> usize {
        self.tweets.values().map(|m| m.len()).sum()
    }

    /// Space-joined raw texts of an author's documents
    pub fn text_corpus(&self, author: &str) -> String {
        self.documents(author).fold(String::new(), |mut acc, d| {
            acc.push(' ');
            acc.push_str(&d.raw_text);
            acc
        })
    }

    /// Space-prefixed handles mentioned by an author, `" "` if none
    pub fn mention_corpus(&self, author: &str) -> String {
        let handles: Vec<&str> = self
            .documents(author)
            .flat_map(|d| d.mentions.iter().map(|m| m.as_str()))
            .collect();
        mention_text(&handles)
    }
}

/// Read one source collection: a JSON object of tweet id -> record
pub fn read_source(path: &Path) -> Result<IndexMap<String, RawTweet>> {
    let raw = fs::read_to_string(path).map_err(|source| Error::SourceUnreadable {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::SourceMalformed {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::analyzer::{TweetAnalyzer, WhitespaceAnalyzer};

    fn raw(user: &str, text: &str, tags: Vec<Option<&str>>) -> RawTweet {
        RawTweet {
            user_name: user.to_string(),
            screen_name: user.replace(' ', ""),
            date: "Sat Dec 12 00:00:00 +0000 2020".to_string(),
            text: text.to_string(),
            hashtags: tags.into_iter().map(|t| t.map(str::to_string)).collect(),
        }
    }

    #[test]
    fn extracts_entities() {
        let text = "Great launch @NASA @SpaceX 🚀🔥 https://t.co/abc";
        assert_eq!(extract_mentions(text), vec!["NASA", "SpaceX"]);
        assert_eq!(extract_links(text), vec!["https://t.co/abc"]);
        assert_eq!(extract_emojis(text), vec!["🚀", "🔥"]);
        assert!(extract_mentions("no handles here").is_empty());
    }

    #[test]
    fn mention_text_is_never_empty() {
        assert_eq!(mention_text::<&str>(&[]), " ");
        assert_eq!(mention_text(&["a", "b"]), " a b");
    }

    #[test]
    fn null_hashtags_become_empty() {
        let d = Document::from_raw("1", &raw("Katie Mack", "dark matter", vec![None]), &WhitespaceAnalyzer);
        assert!(d.hashtags.is_empty());
        let d = Document::from_raw("2", &raw("Katie Mack", "dark", vec![Some("space"), None]), &WhitespaceAnalyzer);
        assert_eq!(d.hashtags, vec!["space"]);
    }

    #[test]
    fn extend_groups_by_author_and_counts() {
        let mut records = IndexMap::new();
        records.insert("1".to_string(), raw("Brian Cox", "physics is fun @CERN", vec![Some("science")]));
        records.insert("2".to_string(), raw("Joe Biden", "vote today", vec![None]));
        records.insert("3".to_string(), raw("Brian Cox", "more physics @CERN @ESA", vec![None]));
        let mut parsed = ParsedCorpus::new();
        parsed.extend(&records, &TweetAnalyzer::new());

        assert_eq!(parsed.authors().collect::<Vec<_>>(), vec!["Brian Cox", "Joe Biden"]);
        assert_eq!(parsed.doc_num(), 3);
        let cox = &parsed.frequency;
        assert_eq!(cox.text["Brian Cox"].term_count("physic"), 2);
        assert_eq!(cox.mentions["Brian Cox"].term_count("CERN"), 2);
        assert_eq!(cox.hashtags["Brian Cox"].term_count("science"), 1);
        assert!(cox.mentions["Joe Biden"].is_empty());
        assert_eq!(parsed.mention_corpus("Brian Cox"), " CERN CERN ESA");
        assert_eq!(parsed.mention_corpus("Joe Biden"), " ");
        assert_eq!(parsed.text_corpus("Joe Biden"), " vote today");
    }

    #[test]
    fn parse_without_sources_is_fatal() {
        let none: [PathBuf; 0] = [];
        assert!(matches!(ParsedCorpus::parse(&none, &WhitespaceAnalyzer), Err(Error::NoSourceCollections)));
    }

    #[test]
    fn parse_reports_bad_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ParsedCorpus::parse(&[&missing], &WhitespaceAnalyzer),
            Err(Error::SourceUnreadable { .. })
        ));
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[1, 2, 3]").unwrap();
        assert!(matches!(
            ParsedCorpus::parse(&[&bad], &WhitespaceAnalyzer),
            Err(Error::SourceMalformed { .. })
        ));
    }
}
