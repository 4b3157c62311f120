//! Reading-time estimate

use super::post::ContentBlock;

/// Reading speed assumed when the site does not configure one
pub const WORDS_PER_MINUTE: usize = 200;

/// Words across every heading and body of the post
pub fn word_count(blocks: &[ContentBlock]) -> usize {
    blocks
        .iter()
        .map(|block| {
            block.heading.split_whitespace().count() + block.body_text().split_whitespace().count()
        })
        .sum()
}

/// Minutes to read the blocks at the default speed
pub fn reading_time(blocks: &[ContentBlock]) -> usize {
    reading_time_at(blocks, WORDS_PER_MINUTE)
}

/// Minutes to read the blocks at `words_per_minute`
pub fn reading_time_at(blocks: &[ContentBlock], words_per_minute: usize) -> usize {
    minutes_for(word_count(blocks), words_per_minute)
}

/// `ceil(words / words_per_minute)`; any nonzero count takes at least a minute
pub fn minutes_for(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichTextNode;

    fn block(heading: &str, paragraphs: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: paragraphs.iter().map(|p| RichTextNode::paragraph(*p)).collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_minutes_round_up() {
        assert_eq!(minutes_for(0, 200), 0);
        assert_eq!(minutes_for(1, 200), 1);
        assert_eq!(minutes_for(200, 200), 1);
        assert_eq!(minutes_for(201, 200), 2);
        assert_eq!(minutes_for(1000, 200), 5);
    }

    #[test]
    fn test_zero_speed_does_not_divide_by_zero() {
        assert_eq!(minutes_for(3, 0), 3);
    }

    #[test]
    fn test_word_count_includes_headings_and_bodies() {
        let blocks = vec![
            block("Proin et varius", &["Lorem ipsum  dolor", "sit\namet"]),
            block("", &[]),
            block("Cras", &[" "]),
        ];
        assert_eq!(word_count(&blocks), 3 + 3 + 2 + 1);
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time(&[]), 0);

        let blocks = vec![block("Title here", &[words(199).as_str()])];
        assert_eq!(word_count(&blocks), 201);
        assert_eq!(reading_time(&blocks), 2);
        assert_eq!(reading_time_at(&blocks, 250), 1);
    }

    #[test]
    fn test_any_content_is_at_least_one_minute() {
        let blocks = vec![block("Oi", &[])];
        assert_eq!(reading_time(&blocks), 1);
    }
}
