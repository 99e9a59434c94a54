use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}_]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","almost","along","already","also","although","always","am","among","an","and","another","any","are","around","as","at",
            "be","became","because","become","been","before","being","below","beside","between","beyond","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","either","else","enough","etc","even","ever","every","few","for","from","further",
            "had","has","have","having","he","hence","her","here","hers","herself","him","himself","his","how","however",
            "i","ie","if","in","into","is","it","its","itself",
            "just","may","me","might","more","moreover","most","much","must","my","myself",
            "neither","never","no","nor","not","now","of","off","often","on","once","only","onto","or","other","others","otherwise","ought","our","ours","ourselves","out","over","own",
            "per","perhaps","rather","same","she","should","since","so","some","still","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","though","through","thus","to","too","toward",
            "under","until","up","upon","us","very","via",
            "was","we","well","were","what","whatever","when","where","whether","which","while","who","whoever","whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into lowercase word terms using NFKC normalization and stopword removal.
/// Single-character tokens are dropped. Output preserves document order and repeats.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if token.chars().count() < 2 || is_stopword(token) { continue; }
        tokens.push(token.to_string());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Space, ADVENTURE! space 2001");
        assert_eq!(t, vec!["space", "adventure", "space", "2001"]);
    }

    #[test]
    fn possessives_split_at_apostrophe() {
        assert_eq!(tokenize("Batman's"), vec!["batman"]);
        assert_eq!(tokenize("Batman's war with the Joker"), vec!["batman", "war", "joker"]);
    }

    #[test]
    fn drops_single_chars() {
        assert!(tokenize("a b c x").is_empty());
    }
}
