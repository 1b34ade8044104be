//! Baget text generation.
//!
//! A baget is a handful of uppercase lines of random words, each pair of
//! lines divided by a line holding only the separator marker:
//!
//! ```text
//! MOM SAYS GO HOME NOW
//! @
//! I GO HOME AND CAT IS ALREADY THERE
//! ...
//! ```
//!
//! Generation is the only consumer of randomness in the crate.

mod rng;
mod vocabulary;

pub use rng::{RandomSource, SequenceSource, SharedRng};
pub use vocabulary::WORDS;

use crate::config::{LINE_COUNT, SEPARATOR, WORD_COUNT};

/// Generate one baget from `source`.
///
/// Output is fully determined by the values drawn from `source`.
pub fn generate(source: &dyn RandomSource) -> Vec<u8> {
    let lines = source.uniform(LINE_COUNT);
    let separator = format!("\n{}\n", SEPARATOR);

    let text = (0..lines)
        .map(|_| {
            let words = source.uniform(WORD_COUNT);
            (0..words)
                .map(|_| WORDS[source.uniform(0..=WORDS.len() - 1)])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(&separator);

    let mut content = text.to_uppercase().into_bytes();
    content.push(b'\n');
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_lines(content: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(content).unwrap();
        text.lines()
            .filter(|l| *l != "@")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_fixed_sequence_exact_output() {
        // Every draw folds to its range start: 4 lines of 5 copies of WORDS[0].
        let source = SequenceSource::new(vec![0]);
        let content = generate(&source);

        let line = vec!["I"; 5].join(" ");
        let expected = format!("{l}\n@\n{l}\n@\n{l}\n@\n{l}\n", l = line);
        assert_eq!(String::from_utf8(content).unwrap(), expected);
        // 1 line count + 4 word counts + 20 words
        assert_eq!(source.draws(), 25);
    }

    #[test]
    fn test_structure_holds_for_many_seeds() {
        for seed in 0..200 {
            let content = generate(&SharedRng::with_seed(seed));
            let text = std::str::from_utf8(&content).unwrap();

            assert!(text.ends_with('\n'));
            assert!(!text.ends_with("\n\n"));
            assert_eq!(text, text.to_uppercase());

            let all: Vec<&str> = text.lines().collect();
            for (i, l) in all.iter().enumerate() {
                // separators sit on odd lines only
                assert_eq!(*l == "@", i % 2 == 1, "line {}: {:?}", i, l);
            }

            let lines = text_lines(&content);
            assert!(LINE_COUNT.contains(&lines.len()), "{} lines", lines.len());
            for l in &lines {
                let words = l.split(' ').count();
                assert!(WORD_COUNT.contains(&words), "{} words in {:?}", words, l);
            }
        }
    }

    #[test]
    fn test_independent_draws_differ() {
        let source = SharedRng::with_seed(99);
        let first = generate(&source);
        let distinct = (0..16).any(|_| generate(&source) != first);
        assert!(distinct);
    }
}
