//! Document tokenization
//!
//! Turns raw document text into the token stream every other component
//! works on. Paragraphs split on newlines, sentences end after `.`, `!`
//! or `?` (the terminator attaches to the sentence it ends), and
//! punctuation characters are emitted as their own tokens.
//!
//! Offsets and lengths are char-indexed into the source text, so
//! `text[offset..offset+length]` (by chars) reproduces the token text.

use crate::models::Token;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Tokenize document text into the full document token stream
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut paragraph = 0usize;
    let mut sentence = 0usize;
    let mut paragraph_open = false;
    let mut sentence_open = false;
    let mut word = String::new();
    let mut word_start = 0usize;

    let flush_word = |tokens: &mut Vec<Token>,
                          word: &mut String,
                          word_start: usize,
                          paragraph: usize,
                          sentence: usize| {
        if word.is_empty() {
            return false;
        }
        let index = tokens.len();
        tokens.push(Token::new(
            index,
            word_start,
            std::mem::take(word),
            paragraph,
            sentence,
        ));
        true
    };

    for (offset, c) in text.chars().enumerate() {
        if c == '\n' {
            if flush_word(&mut tokens, &mut word, word_start, paragraph, sentence) {
                sentence_open = true;
                paragraph_open = true;
            }
            if paragraph_open {
                paragraph += 1;
                paragraph_open = false;
                if sentence_open {
                    sentence += 1;
                    sentence_open = false;
                }
            }
        } else if c.is_whitespace() {
            if flush_word(&mut tokens, &mut word, word_start, paragraph, sentence) {
                sentence_open = true;
                paragraph_open = true;
            }
        } else if is_word_char(c) {
            if word.is_empty() {
                word_start = offset;
            }
            word.push(c);
        } else {
            flush_word(&mut tokens, &mut word, word_start, paragraph, sentence);
            let index = tokens.len();
            tokens.push(Token::new(index, offset, c.to_string(), paragraph, sentence));
            paragraph_open = true;
            if is_sentence_terminator(c) {
                sentence += 1;
                sentence_open = false;
            } else {
                sentence_open = true;
            }
        }
    }
    flush_word(&mut tokens, &mut word, word_start, paragraph, sentence);

    tokens
}

/// Slice the source text for a char range (offset, length)
pub fn slice_chars(text: &str, offset: usize, length: usize) -> String {
    text.chars().skip(offset).take(length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sentence() {
        let tokens = tokenize("The cat sat.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["The", "cat", "sat", "."]);
        assert!(tokens.iter().all(|t| t.sentence == 0));
        assert!(tokens.iter().all(|t| t.paragraph == 0));
        assert_eq!(tokens[3].offset, 11);
    }

    #[test]
    fn test_sentence_numbering() {
        let tokens = tokenize("Hello! Bye now.");
        assert_eq!(tokens[0].sentence, 0); // Hello
        assert_eq!(tokens[1].sentence, 0); // !
        assert_eq!(tokens[2].sentence, 1); // Bye
        assert_eq!(tokens[3].sentence, 1); // now
        assert_eq!(tokens[4].sentence, 1); // .
    }

    #[test]
    fn test_paragraph_numbering() {
        let tokens = tokenize("one two\n\nthree");
        assert_eq!(tokens[0].paragraph, 0);
        assert_eq!(tokens[1].paragraph, 0);
        assert_eq!(tokens[2].paragraph, 1);
        // sentence count also advances across the paragraph break
        assert_eq!(tokens[2].sentence, 1);
    }

    #[test]
    fn test_offsets_round_trip() {
        let text = "The cat, so to speak, sat.\nIt did!";
        for token in tokenize(text) {
            assert_eq!(
                slice_chars(text, token.offset, token.length),
                token.text,
                "offset round-trip failed for {:?}",
                token
            );
        }
    }

    #[test]
    fn test_indices_are_dense() {
        let tokens = tokenize("a b c. d");
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.index, i);
            assert_eq!(token.array_index, i);
            assert!(token.codable);
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n \n").is_empty());
    }
}
