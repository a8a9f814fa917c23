//! Message length helpers
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Discord message content limit, in bytes of UTF-8
pub const MESSAGE_LIMIT: usize = 2000;

/// Split `text` into messages no longer than [`MESSAGE_LIMIT`]
///
/// Lines are kept whole where possible; a single line longer than the limit
/// is cut on character boundaries.
pub fn chunk_for_message(text: &str) -> Vec<String> {
    pack_lines(text, MESSAGE_LIMIT)
}

fn pack_lines(text: &str, limit: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        for piece in split_line(line, limit) {
            let needed = if current.is_empty() {
                piece.len()
            } else {
                current.len() + 1 + piece.len()
            };
            if needed > limit {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(piece);
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cut a line into slices of at most `limit` bytes on char boundaries
fn split_line(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while rest.len() > limit {
        let mut end = limit;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}
