use chrono::{Local, TimeZone};

use biliwatch_common::types::{normalize_duration, render_count};
use biliwatch_common::VideoRecord;

/// Character budget per outgoing message. Longer compositions are split
/// into chunks of at most this many characters (characters, not bytes).
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Render one record as a labeled notification text.
///
/// A field the provider could not fill is omitted entirely rather than
/// rendered empty. `matched` lists the match keywords that hit this title;
/// empty means no keyword filter was in play.
pub fn compose(record: &VideoRecord, keyword: &str, matched: &[String]) -> String {
    let mut lines = vec![format!("🎬 推荐视频 - {keyword}")];

    if !record.title.is_empty() {
        lines.push(format!("标题: {}", record.title));
    }
    if !matched.is_empty() {
        lines.push(format!("关键词: {}", matched.join("、")));
    }
    if !record.author.is_empty() {
        lines.push(format!("UP主: {}", record.author));
    }

    let mut stats = Vec::new();
    if record.play > 0 {
        stats.push(format!("播放: {}", render_count(record.play)));
    }
    if record.like > 0 {
        stats.push(format!("点赞: {}", render_count(record.like)));
    }
    if !stats.is_empty() {
        lines.push(stats.join(" | "));
    }

    let mut when = Vec::new();
    let duration = normalize_duration(&record.duration);
    if !duration.is_empty() {
        when.push(format!("时长: {duration}"));
    }
    if record.pubdate > 0 {
        if let Some(published) = Local.timestamp_opt(record.pubdate, 0).single() {
            when.push(format!("发布时间: {}", published.format("%Y-%m-%d %H:%M")));
        }
    }
    if !when.is_empty() {
        lines.push(when.join(" | "));
    }

    if !record.url.is_empty() {
        lines.push(format!("链接: {}", record.url));
    }

    lines.join("\n")
}

/// Split a text into chunks of at most `max_chars` characters, packing
/// whole lines greedily.
///
/// Lines are never cut. A single line longer than the budget becomes its
/// own oversized chunk rather than being truncated. Chunks come back
/// trimmed with empties dropped.
pub fn split(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in text.lines() {
        let line_chars = line.chars().count();
        let needed = if current.is_empty() {
            line_chars
        } else {
            // +1 for the joining newline
            line_chars + 1
        };

        if current_chars + needed > max_chars && !current.is_empty() {
            push_chunk(&mut chunks, &mut current);
            current_chars = 0;
        }

        if line_chars > max_chars {
            push_chunk(&mut chunks, &mut current);
            let oversized = line.trim();
            if !oversized.is_empty() {
                chunks.push(oversized.to_string());
            }
            current_chars = 0;
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    push_chunk(&mut chunks, &mut current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use biliwatch_common::types::video_url;

    fn sample_record() -> VideoRecord {
        VideoRecord {
            bvid: "BV1aa111".to_string(),
            title: "Rust 所有权详解".to_string(),
            author: "编程老王".to_string(),
            url: "https://www.bilibili.com/video/BV1aa111".to_string(),
            play: 52_000,
            like: 1_200,
            duration: "12:34".to_string(),
            pubdate: 1_700_000_000,
        }
    }

    #[test]
    fn compose_includes_all_known_fields() {
        let text = compose(&sample_record(), "Rust", &["所有权".to_string()]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "🎬 推荐视频 - Rust");
        assert_eq!(lines[1], "标题: Rust 所有权详解");
        assert_eq!(lines[2], "关键词: 所有权");
        assert_eq!(lines[3], "UP主: 编程老王");
        assert_eq!(lines[4], "播放: 5.2万 | 点赞: 1200");
        assert!(lines[5].starts_with("时长: 0:12:34 | 发布时间: "));
        assert_eq!(lines[6], "链接: https://www.bilibili.com/video/BV1aa111");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn compose_omits_fields_the_provider_left_empty() {
        let record = VideoRecord {
            bvid: "BV1bb".to_string(),
            url: video_url("BV1bb"),
            ..Default::default()
        };
        let text = compose(&record, "Rust", &[]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "🎬 推荐视频 - Rust");
        assert_eq!(lines[1], "链接: https://www.bilibili.com/video/BV1bb");
        assert!(!text.contains("标题"));
        assert!(!text.contains("UP主"));
        assert!(!text.contains("播放"));
    }

    #[test]
    fn compose_joins_matched_keywords() {
        let matched = vec!["所有权".to_string(), "详解".to_string()];
        let text = compose(&sample_record(), "Rust", &matched);
        assert!(text.contains("关键词: 所有权、详解"));
    }

    #[test]
    fn short_text_stays_one_chunk() {
        let chunks = split("hello\nworld", 50);
        assert_eq!(chunks, vec!["hello\nworld".to_string()]);
    }

    #[test]
    fn lines_pack_greedily_counting_the_joining_newline() {
        // "aaa\nbbb" is exactly 7 characters, "ccc" no longer fits.
        let chunks = split("aaa\nbbb\nccc", 7);
        assert_eq!(chunks, vec!["aaa\nbbb".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn exact_budget_fits() {
        let chunks = split("abc", 3);
        assert_eq!(chunks, vec!["abc".to_string()]);
    }

    #[test]
    fn oversized_line_becomes_its_own_chunk() {
        let chunks = split("aa\nbbbbbbbb\ncc", 5);
        assert_eq!(
            chunks,
            vec!["aa".to_string(), "bbbbbbbb".to_string(), "cc".to_string()]
        );
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // Each line is 2 characters but far more than 2 bytes.
        let chunks = split("🎬🎬\n口口", 2);
        assert_eq!(chunks, vec!["🎬🎬".to_string(), "口口".to_string()]);
    }

    #[test]
    fn split_preserves_line_order_and_content() {
        let text = compose(&sample_record(), "Rust", &[]);
        let chunks = split(&text, 50);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
        let original: Vec<&str> = text.lines().collect();
        assert_eq!(rejoined, original);
    }
}
