use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    // Hyphen-joined runs stay together: `cross-site-scripting`, `cve-2021-1234`.
    static ref WORD: Regex =
        Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*(?:-[\p{L}\p{N}][\p{L}\p{N}_']*)*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Compatibility-decompose, drop diacritics and lowercase.
fn normalize(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

fn analyze(token: &str) -> Option<String> {
    if token.is_empty() || is_stopword(token) { return None; }
    Some(STEMMER.stem(token).into_owned())
}

/// Tokenize field text into (term, position).
///
/// A hyphenated word is emitted whole and once per hyphen-separated part, all
/// at the position of the source word, so both `cross-site-scripting` and
/// `site` find it.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = normalize(text);
    let mut tokens = Vec::new();
    for (pos, mat) in WORD.find_iter(&normalized).enumerate() {
        let word = mat.as_str();
        if let Some(term) = analyze(word) {
            tokens.push((term, pos));
        }
        if word.contains('-') {
            for part in word.split('-') {
                if let Some(term) = analyze(part) {
                    tokens.push((term, pos));
                }
            }
        }
    }
    tokens
}

/// Normalize query text into distinct terms, in order of first appearance.
///
/// Unlike [`tokenize`], hyphenated words are never split.
pub fn query_terms(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut terms: Vec<String> = Vec::new();
    for mat in WORD.find_iter(&normalized) {
        if let Some(term) = analyze(mat.as_str()) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert!(t.iter().any(|(w, _)| w == "run"));
    }

    #[test]
    fn hyphenated_word_keeps_compound_and_parts() {
        let t = tokenize("cross-site-scripting");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words.len(), 4);
        assert!(words.contains(&"cross"));
        assert!(t.iter().all(|(_, pos)| *pos == 0));
    }

    #[test]
    fn query_terms_do_not_split_hyphens() {
        let terms = query_terms("Cross-Site-Scripting");
        assert_eq!(terms.len(), 1);
        assert!(terms[0].starts_with("cross-site-"));
    }

    #[test]
    fn query_terms_are_deduplicated() {
        let terms = query_terms("ruby Ruby RUBY");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms, query_terms("ruby"));
    }
}
