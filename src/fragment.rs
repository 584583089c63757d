//! Sentence-aligned text fragmentation.
//!
//! Splits extracted article text into fragments bounded by word count:
//! a hard upper bound (except for single oversized sentences, kept whole)
//! and a soft lower bound. Pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

/// Strong terminal punctuation followed by whitespace marks a sentence
/// boundary.
static SENTENCE_TERMINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("sentence boundary pattern is valid"));

/// Splits `text` into sentences, keeping terminal punctuation attached.
fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_TERMINAL.find_iter(text) {
        let sentence = text[start..boundary.end()].trim_end();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Greedily accumulates sentences into fragments of `min_words..=max_words`
/// words.
///
/// Rules, in order:
/// - a single sentence longer than `max_words` becomes its own fragment,
///   flushing any accumulation first;
/// - a sentence that fits under `max_words` is appended;
/// - otherwise the accumulation is flushed if it already meets `min_words`;
/// - otherwise the sentence is appended anyway, trading a max-words
///   overflow for never emitting a fragment under `min_words`.
pub fn split_into_fragments(text: &str, max_words: usize, min_words: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for sentence in split_sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        if words.len() > max_words {
            if !current.is_empty() {
                fragments.push(current.join(" "));
                current.clear();
            }
            fragments.push(sentence.to_string());
        } else if current.len() + words.len() <= max_words {
            current.extend(words);
        } else if current.len() >= min_words {
            fragments.push(current.join(" "));
            current = words;
        } else {
            current.extend(words);
        }
    }

    if !current.is_empty() {
        fragments.push(current.join(" "));
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(fragment: &str) -> usize {
        fragment.split_whitespace().count()
    }

    fn sentence_of(words: usize, index: usize) -> String {
        let body: Vec<String> = (0..words - 1).map(|w| format!("palabra{index}x{w}")).collect();
        format!("{} fin.", body.join(" "))
    }

    #[test]
    fn sentences_split_on_strong_punctuation() {
        let sentences = split_sentences("Primera frase. ¿Segunda frase? Sí! Última");
        assert_eq!(
            sentences,
            vec!["Primera frase.", "¿Segunda frase?", "Sí!", "Última"]
        );
    }

    #[test]
    fn fragments_respect_word_bounds() {
        let text: Vec<String> = (0..40).map(|i| sentence_of(12, i)).collect();
        let text = text.join(" ");
        let fragments = split_into_fragments(&text, 100, 30);

        assert!(!fragments.is_empty());
        for fragment in &fragments[..fragments.len() - 1] {
            let count = word_count(fragment);
            assert!((30..=100).contains(&count), "fragment of {count} words");
        }
        assert!(word_count(fragments.last().unwrap()) <= 100);
    }

    #[test]
    fn oversized_sentence_becomes_its_own_fragment() {
        let huge = sentence_of(50, 0);
        let text = format!("{} {} {}", sentence_of(10, 1), huge, sentence_of(10, 2));
        let fragments = split_into_fragments(&text, 30, 5);

        assert_eq!(fragments.len(), 3);
        assert_eq!(word_count(&fragments[1]), 50);
        assert_eq!(fragments[1], huge);
    }

    #[test]
    fn under_min_accumulation_absorbs_overflowing_sentence() {
        // 20 accumulated words (< min 25) plus a 15-word sentence that
        // would overflow max 30: appended anyway.
        let text = format!("{} {}", sentence_of(20, 0), sentence_of(15, 1));
        let fragments = split_into_fragments(&text, 30, 25);
        assert_eq!(fragments.len(), 1);
        assert_eq!(word_count(&fragments[0]), 35);
    }

    #[test]
    fn twelve_hundred_words_split_into_four_fragments() {
        // 60 sentences of 20 words each, production bounds.
        let text: Vec<String> = (0..60).map(|i| sentence_of(20, i)).collect();
        let text = text.join(" ");
        let fragments = split_into_fragments(&text, 340, 80);

        assert_eq!(fragments.len(), 4);
        for fragment in &fragments {
            assert!(word_count(fragment) <= 340);
        }
    }

    #[test]
    fn fragmentation_is_deterministic() {
        let text: Vec<String> = (0..25).map(|i| sentence_of(17, i)).collect();
        let text = text.join(" ");
        assert_eq!(
            split_into_fragments(&text, 120, 40),
            split_into_fragments(&text, 120, 40)
        );
    }

    #[test]
    fn empty_and_blank_input_yield_no_fragments() {
        assert!(split_into_fragments("", 340, 80).is_empty());
        assert!(split_into_fragments("   \n\t ", 340, 80).is_empty());
    }
}
