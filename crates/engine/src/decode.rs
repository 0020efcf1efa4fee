//! Minimal-assumption decoding of provider stream chunks.
//!
//! Each transport chunk is decoded independently, line by line. A line is
//! cleaned of an optional SSE `data:` prefix, then interpreted with the
//! loosest rule that extracts text: a JSON object's `content` or `delta`
//! field, a bare JSON string, or the raw line itself when it is not JSON.
//! Lines that decode to nothing are dropped silently.

/// SSE stream-terminator token.
const STREAM_DONE: &str = "[DONE]";

/// Decode one transport chunk into zero or more text fragments.
///
/// Chunks are decoded independently; a JSON object split across two chunks
/// degrades to literal text rather than being reassembled.
pub fn decode_chunk(chunk: &str) -> Vec<String> {
    chunk
        .split('\n')
        .map(strip_data_prefix)
        .filter(|line| !line.is_empty() && *line != STREAM_DONE)
        .filter_map(extract_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Strip a leading case-insensitive `data:` plus any whitespace after it.
fn strip_data_prefix(line: &str) -> &str {
    let prefix_len = "data:".len();
    match line.get(..prefix_len) {
        Some(head) if head.eq_ignore_ascii_case("data:") => line[prefix_len..].trim_start(),
        _ => line,
    }
}

fn extract_text(line: &str) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(serde_json::Value::Object(obj)) => {
            let content = obj.get("content").and_then(|v| v.as_str()).unwrap_or("");
            if !content.is_empty() {
                return Some(content.to_string());
            }
            let delta = obj.get("delta").and_then(|v| v.as_str()).unwrap_or("");
            if !delta.is_empty() {
                return Some(delta.to_string());
            }
            None
        }
        Ok(serde_json::Value::String(s)) => Some(s),
        // Other valid JSON (numbers, arrays, null) carries no text.
        Ok(_) => None,
        // Not JSON at all: treat the line as literal text.
        Err(_) => Some(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_line_passes_through() {
        assert_eq!(decode_chunk("hello world"), vec!["hello world"]);
    }

    #[test]
    fn sse_data_prefix_is_stripped() {
        assert_eq!(decode_chunk(r#"data: {"content":"hi"}"#), vec!["hi"]);
        assert_eq!(decode_chunk(r#"DATA:{"content":"hi"}"#), vec!["hi"]);
    }

    #[test]
    fn done_token_and_blank_lines_are_dropped() {
        assert!(decode_chunk("data: [DONE]").is_empty());
        assert!(decode_chunk("\n\n").is_empty());
        assert!(decode_chunk("").is_empty());
    }

    #[test]
    fn json_object_content_wins_over_delta() {
        assert_eq!(decode_chunk(r#"{"content":"a","delta":"b"}"#), vec!["a"]);
    }

    #[test]
    fn empty_content_falls_back_to_delta() {
        assert_eq!(decode_chunk(r#"{"content":"","delta":"b"}"#), vec!["b"]);
    }

    #[test]
    fn bare_json_string_is_text() {
        assert_eq!(decode_chunk(r#""quoted""#), vec!["quoted"]);
    }

    #[test]
    fn json_without_text_fields_is_dropped() {
        assert!(decode_chunk(r#"{"usage":{"total_tokens":10}}"#).is_empty());
        assert!(decode_chunk("42").is_empty());
        assert!(decode_chunk("null").is_empty());
    }

    #[test]
    fn multi_line_chunk_yields_ordered_fragments() {
        let chunk = "data: {\"content\":\"Hel\"}\ndata: {\"content\":\"lo\"}\ndata: [DONE]\n";
        assert_eq!(decode_chunk(chunk), vec!["Hel", "lo"]);
    }

    #[test]
    fn split_json_degrades_to_literal_text() {
        // A JSON object cut mid-chunk does not parse, so both halves come
        // through verbatim.
        assert_eq!(decode_chunk(r#"{"content":"he"#), vec![r#"{"content":"he"#]);
    }
}
