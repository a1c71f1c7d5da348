//! Metadata block scanner.
//!
//! Finds `<!--MARKER payload-->` regions in page text. Delimiters nest: a
//! start token seen while a block is still open is absorbed into that block,
//! and the block only closes when the matching end token brings the nesting
//! depth back to zero.
//!
//! ```text
//! before <!--INCLUDE <!--not closed yet--> still inside--> after
//!        ^ start                                         ^ end
//! ```

/// Token that opens a metadata block.
pub const START_TOKEN: &str = "<!--";

/// Token that closes a metadata block.
pub const END_TOKEN: &str = "-->";

/// A metadata block found by [`scan`].
///
/// All fields borrow from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBlock<'a> {
    /// Text between the end of the previous block (or the start of the
    /// buffer) and this block's start token.
    pub before: &'a str,
    /// Leading identifier of the block content, as written.
    pub marker: &'a str,
    /// Everything after the marker up to the end token, untrimmed.
    pub metadata: &'a str,
    /// The whole block including both delimiters.
    pub metadata_block: &'a str,
    /// Byte offset of the start token.
    pub start_position: usize,
    /// Byte offset just past the end token.
    pub end_position: usize,
}

/// Scan `text` for metadata blocks, left to right.
///
/// The returned iterator is lazy and borrows `text`; each block's
/// `end_position` is strictly greater than the previous one's.
pub fn scan(text: &str) -> MetadataBlocks<'_> {
    MetadataBlocks {
        text,
        cursor: 0,
        done: 0,
        open: Vec::new(),
    }
}

/// Iterator over the metadata blocks of a text. Created by [`scan`].
#[derive(Debug)]
pub struct MetadataBlocks<'a> {
    text: &'a str,
    /// Position of the next token search.
    cursor: usize,
    /// End of the last yielded block.
    done: usize,
    /// Positions of start tokens that are still open.
    open: Vec<usize>,
}

impl<'a> MetadataBlocks<'a> {
    /// Text after the last yielded block.
    ///
    /// Once the iterator is exhausted this is the tail that follows every
    /// block, so `before` and `metadata_block` fragments followed by the
    /// remainder reproduce the scanned text.
    pub fn remainder(&self) -> &'a str {
        &self.text[self.done..]
    }
}

impl<'a> Iterator for MetadataBlocks<'a> {
    type Item = MetadataBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.text[self.cursor..];
            let start = rest.find(START_TOKEN);
            let end = rest.find(END_TOKEN);

            match (start, end) {
                (Some(s), e) if e.is_none_or(|e| s < e) => {
                    self.open.push(self.cursor + s);
                    self.cursor += s + START_TOKEN.len();
                }
                (_, Some(e)) => {
                    let end_token_at = self.cursor + e;
                    self.cursor = end_token_at + END_TOKEN.len();

                    // Stray end token: stays ordinary text.
                    let Some(block_start) = self.open.pop() else {
                        continue;
                    };
                    if !self.open.is_empty() {
                        continue;
                    }

                    let content = &self.text[block_start + START_TOKEN.len()..end_token_at];
                    let Some((marker, metadata)) = split_marker(content) else {
                        continue;
                    };

                    let block = MetadataBlock {
                        before: &self.text[self.done..block_start],
                        marker,
                        metadata,
                        metadata_block: &self.text[block_start..self.cursor],
                        start_position: block_start,
                        end_position: self.cursor,
                    };
                    self.done = self.cursor;
                    return Some(block);
                }
                (_, None) => return None,
            }
        }
    }
}

/// Split block content into its marker and the raw payload after it.
///
/// Returns `None` when the content does not start with an identifier
/// character; such a region is an ordinary comment.
fn split_marker(content: &str) -> Option<(&str, &str)> {
    let marker_len = content
        .char_indices()
        .find(|&(_, c)| !is_marker_char(c))
        .map_or(content.len(), |(i, _)| i);

    if marker_len == 0 {
        return None;
    }
    Some(content.split_at(marker_len))
}

fn is_marker_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn reconstruct(text: &str) -> String {
        let mut blocks = scan(text);
        let mut result = String::new();
        for block in blocks.by_ref() {
            result.push_str(block.before);
            result.push_str(block.metadata_block);
        }
        result.push_str(blocks.remainder());
        result
    }

    #[test]
    fn test_single_block() {
        let text = "Hello <!--VARIABLES {\"title\": \"T\"}--> world";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 1);
        let block = blocks[0];
        assert_eq!(block.before, "Hello ");
        assert_eq!(block.marker, "VARIABLES");
        assert_eq!(block.metadata, " {\"title\": \"T\"}");
        assert_eq!(block.metadata_block, "<!--VARIABLES {\"title\": \"T\"}-->");
        assert_eq!(block.start_position, 6);
        assert_eq!(block.end_position, text.len() - " world".len());
    }

    #[test]
    fn test_multiple_blocks_before_is_relative_to_previous_block() {
        let text = "a<!--X 1-->b<!--Y 2-->c";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].before, "a");
        assert_eq!(blocks[1].before, "b");
        assert_eq!(blocks[1].marker, "Y");
        assert!(blocks[0].end_position < blocks[1].end_position);
    }

    #[test]
    fn test_reconstruction() {
        let texts = [
            "",
            "no blocks at all",
            "<!--A-->",
            "x <!--A 1--> y <!--B 2--> z",
            "<!--A <!--B--> c--> tail",
            "--> stray <!-- comment --> <!--M m-->",
            "unterminated <!--A never closed",
            "Ünïcödé <!--Маркер дані--> ok",
        ];
        for text in texts {
            assert_eq!(reconstruct(text), text, "text: {text:?}");
        }
    }

    #[test]
    fn test_nested_start_absorbed() {
        let text = "<!--INCLUDE <!--inner--> rest-->after";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].marker, "INCLUDE");
        assert_eq!(blocks[0].metadata, " <!--inner--> rest");
        assert_eq!(blocks[0].metadata_block, "<!--INCLUDE <!--inner--> rest-->");
    }

    #[test]
    fn test_stray_end_token_is_text() {
        let text = "a --> b <!--M x--> c";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].before, "a --> b ");
        assert!(!blocks[0].metadata_block.starts_with("-->"));
    }

    #[test]
    fn test_unterminated_start_yields_nothing() {
        let blocks: Vec<_> = scan("text <!--M payload").collect();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_unterminated_start_after_block() {
        let text = "<!--A x--> tail <!--B <!--C open";
        let mut blocks = scan(text);

        let first = blocks.next().unwrap();
        assert_eq!(first.marker, "A");
        assert_eq!(blocks.next(), None);
        assert_eq!(blocks.remainder(), " tail <!--B <!--C open");
    }

    #[test]
    fn test_non_identifier_content_is_plain_comment() {
        let text = "<!-- just a comment -->x<!--M y-->";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].before, "<!-- just a comment -->x");
        assert_eq!(blocks[0].marker, "M");
    }

    #[test]
    fn test_content_of_only_identifier_chars_is_all_marker() {
        let blocks: Vec<_> = scan("<!--ignore_me_123-->").collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].marker, "ignore_me_123");
        assert_eq!(blocks[0].metadata, "");
    }

    #[test]
    fn test_marker_stops_at_first_non_identifier_char() {
        let blocks: Vec<_> = scan("<!--page-links x-->").collect();

        assert_eq!(blocks[0].marker, "page");
        assert_eq!(blocks[0].metadata, "-links x");
    }

    #[test]
    fn test_empty_block_is_not_a_block() {
        assert_eq!(scan("<!---->").count(), 0);
    }

    #[test]
    fn test_overlapping_tokens() {
        // The "-->" inside "<!-->" does not close the block it opens.
        let text = "<!-->A--><!--B-->";
        let blocks: Vec<_> = scan(text).collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].marker, "B");
        assert_eq!(blocks[0].before, "<!-->A-->");
    }

    #[test]
    fn test_unicode_marker() {
        let blocks: Vec<_> = scan("<!--Маркер дані-->").collect();

        assert_eq!(blocks[0].marker, "Маркер");
        assert_eq!(blocks[0].metadata, " дані");
    }
}
