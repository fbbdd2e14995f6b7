//! HTML rendering of text and spans, for the reduced-fidelity send path.

use crate::{FormattingSpan, SpanKind};

/// Escape `&`, `<`, `>` and `"` for the platform's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

fn open_tag(span: &FormattingSpan) -> Option<String> {
    let tag = match span.kind {
        SpanKind::Bold => "<b>".to_string(),
        SpanKind::Italic => "<i>".to_string(),
        SpanKind::Underline => "<u>".to_string(),
        SpanKind::Strikethrough => "<s>".to_string(),
        SpanKind::Spoiler => "<tg-spoiler>".to_string(),
        SpanKind::Code => "<code>".to_string(),
        SpanKind::Blockquote => "<blockquote>".to_string(),
        SpanKind::ExpandableBlockquote => "<blockquote expandable>".to_string(),
        SpanKind::Pre => match &span.language {
            Some(lang) => format!("<pre><code class=\"language-{}\">", escape_html(lang)),
            None => "<pre>".to_string(),
        },
        SpanKind::TextLink => format!("<a href=\"{}\">", escape_html(span.url.as_deref()?)),
        SpanKind::TextMention => format!("<a href=\"tg://user?id={}\">", span.user.as_ref()?.id),
        SpanKind::CustomEmoji => format!(
            "<tg-emoji emoji-id=\"{}\">",
            escape_html(span.custom_emoji_id.as_deref()?)
        ),
        // Detected by the platform from the text itself.
        SpanKind::Mention
        | SpanKind::Hashtag
        | SpanKind::Cashtag
        | SpanKind::BotCommand
        | SpanKind::Url
        | SpanKind::Email
        | SpanKind::PhoneNumber => return None,
        SpanKind::Other(_) => return None,
    };
    Some(tag)
}

fn close_tag(span: &FormattingSpan) -> &'static str {
    match span.kind {
        SpanKind::Bold => "</b>",
        SpanKind::Italic => "</i>",
        SpanKind::Underline => "</u>",
        SpanKind::Strikethrough => "</s>",
        SpanKind::Spoiler => "</tg-spoiler>",
        SpanKind::Code => "</code>",
        SpanKind::Blockquote | SpanKind::ExpandableBlockquote => "</blockquote>",
        SpanKind::Pre if span.language.is_some() => "</code></pre>",
        SpanKind::Pre => "</pre>",
        SpanKind::TextLink | SpanKind::TextMention => "</a>",
        SpanKind::CustomEmoji => "</tg-emoji>",
        _ => "",
    }
}

struct Tagged<'a> {
    span: &'a FormattingSpan,
    open: String,
    start: usize,
    end: usize,
}

/// Close every open span ending at or before `pos`, reopening the spans
/// that had to be closed on the way down the stack.
fn close_ended<'a>(pos: usize, out: &mut String, stack: &mut Vec<Tagged<'a>>) {
    if !stack.iter().any(|t| t.end <= pos) {
        return;
    }
    let mut reopen = Vec::new();
    while let Some(top) = stack.pop() {
        out.push_str(close_tag(top.span));
        if top.end > pos {
            reopen.push(top);
        }
        if !stack.iter().any(|t| t.end <= pos) {
            break;
        }
    }
    while let Some(t) = reopen.pop() {
        out.push_str(&t.open);
        stack.push(t);
    }
}

/// Render `text` with `spans` as platform HTML.
///
/// Offsets are UTF-16 code units. Overlapping spans that do not nest are
/// split so the output stays well-formed. Spans past the end of the text are
/// clipped; kinds the platform detects on its own emit no tags.
///
/// # Examples
///
/// ```
/// use warden_core::{render_html, FormattingSpan, SpanKind};
///
/// let html = render_html("Hi <all>", &[FormattingSpan::new(SpanKind::Bold, 0, 2)]);
/// assert_eq!(html, "<b>Hi</b> &lt;all&gt;");
/// ```
pub fn render_html(text: &str, spans: &[FormattingSpan]) -> String {
    let text_len = crate::utf16_len(text);

    let mut pending: Vec<Tagged<'_>> = spans
        .iter()
        .filter_map(|span| {
            let start = (span.offset as usize).min(text_len);
            let end = (span.end() as usize).min(text_len);
            if start >= end {
                return None;
            }
            let open = open_tag(span)?;
            Some(Tagged {
                span,
                open,
                start,
                end,
            })
        })
        .collect();
    // Longer spans open first so shorter ones nest inside them.
    pending.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    pending.reverse();

    let mut out = String::with_capacity(text.len() + spans.len() * 8);
    let mut stack: Vec<Tagged<'_>> = Vec::new();
    let mut pos = 0usize;

    for c in text.chars() {
        close_ended(pos, &mut out, &mut stack);
        while pending.last().is_some_and(|t| t.start <= pos) {
            if let Some(t) = pending.pop() {
                out.push_str(&t.open);
                stack.push(t);
            }
        }
        push_escaped(&mut out, c);
        pos += c.len_utf16();
    }
    while let Some(top) = stack.pop() {
        out.push_str(close_tag(top.span));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UserId, UserRef};

    #[test]
    fn test_nested_spans() {
        let spans = vec![
            FormattingSpan::new(SpanKind::Bold, 0, 11),
            FormattingSpan::new(SpanKind::Italic, 6, 5),
        ];
        assert_eq!(render_html("hello world", &spans), "<b>hello <i>world</i></b>");
    }

    #[test]
    fn test_overlapping_spans_stay_well_formed() {
        let spans = vec![
            FormattingSpan::new(SpanKind::Bold, 0, 4),
            FormattingSpan::new(SpanKind::Italic, 2, 4),
        ];
        assert_eq!(render_html("abcdef", &spans), "<b>ab<i>cd</i></b><i>ef</i>");
    }

    #[test]
    fn test_link_mention_and_pre() {
        let link = FormattingSpan::builder()
            .kind(SpanKind::TextLink)
            .offset(0u32)
            .length(4u32)
            .url("https://a.example/?x=1&y=2")
            .build()
            .unwrap();
        let mut mention = FormattingSpan::new(SpanKind::TextMention, 5, 3);
        mention.user = Some(UserRef {
            id: UserId(9),
            is_bot: false,
            first_name: "Bob".to_string(),
        });
        let mut pre = FormattingSpan::new(SpanKind::Pre, 9, 2);
        pre.language = Some("sh".to_string());

        let html = render_html("link Bob ls", &[link, mention, pre]);
        assert_eq!(
            html,
            "<a href=\"https://a.example/?x=1&amp;y=2\">link</a> \
             <a href=\"tg://user?id=9\">Bob</a> \
             <pre><code class=\"language-sh\">ls</code></pre>"
        );
    }

    #[test]
    fn test_utf16_offsets_after_astral_chars() {
        // "😀" occupies offsets 0..2, so "ok" starts at 3.
        let spans = vec![FormattingSpan::new(SpanKind::Code, 3, 2)];
        assert_eq!(render_html("😀 ok", &spans), "😀 <code>ok</code>");
    }

    #[test]
    fn test_auto_detected_and_out_of_range_spans() {
        let spans = vec![
            FormattingSpan::new(SpanKind::Hashtag, 0, 4),
            FormattingSpan::new(SpanKind::Bold, 5, 50),
        ];
        assert_eq!(render_html("#tag text", &spans), "#tag <b>text</b>");
    }
}
