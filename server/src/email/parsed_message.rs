use anyhow::Context;
use mail_parser::MessageParser;
use regex::Regex;

lazy_static::lazy_static!(
    static ref RE_WHITESPACE: Regex = Regex::new(r"[\r\t\n]+").unwrap();
    static ref RE_LONG_SPACE: Regex = Regex::new(r" {2,}").unwrap();
    static ref RE_DIVIDERS: Regex = Regex::new(r"[-=_]{3,}").unwrap();
    static ref RE_HTTP_LINK: Regex = Regex::new(r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)").unwrap();
);

/// Structured fields of one inbound message. MIME decoding is entirely
/// delegated to mail-parser; fields it cannot recover become `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedInboundEmail {
    pub from: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub body: Option<String>,
}

impl ParsedInboundEmail {
    /// Best-effort parse of RFC 5322 text. Slightly malformed input still
    /// yields a result; only fundamentally unreadable input is an error.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let msg = MessageParser::default()
            .parse(raw)
            .context("Input is not readable as an RFC 5322 message")?;

        let from = msg
            .from()
            .and_then(|f| f.first().and_then(|a| a.address().map(|s| s.to_string())));
        let subject = msg.subject().map(clean_inline);
        let date = msg.date().map(|d| d.to_rfc3339());

        let body = msg
            .body_text(0)
            .map(|b| b.trim().to_string())
            .or_else(|| {
                msg.body_html(0)
                    .map(|html| html2text::from_read(html.as_bytes(), 80).trim().to_string())
            });

        Ok(ParsedInboundEmail {
            from,
            subject,
            date,
            body,
        })
    }

    /// Body collapsed to a single line with links masked, for prompt
    /// embedding and log output.
    pub fn condensed_body(&self) -> Option<String> {
        self.body.as_ref().map(|b| condense(b))
    }
}

fn clean_inline(s: &str) -> String {
    let s = RE_WHITESPACE.replace_all(s, " ");
    let s = RE_LONG_SPACE.replace_all(&s, " ");
    s.trim().to_string()
}

fn condense(s: &str) -> String {
    let s = RE_HTTP_LINK.replace_all(s, "[LINK]");
    let s = RE_WHITESPACE.replace_all(&s, " ");
    let s = RE_DIVIDERS.replace_all(&s, " ");
    let s = RE_LONG_SPACE.replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "From: Foo Bar <Foo@Bar.com>\r\n\
        To: support@autocrm.io\r\n\
        Subject: Help\r\n\
        Date: Mon, 6 Jan 2025 10:30:00 +0000\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        I need help\r\n";

    #[test]
    fn test_parse_plain_text_message() {
        let parsed = ParsedInboundEmail::parse(SAMPLE).unwrap();

        assert_eq!(parsed.from.as_deref(), Some("Foo@Bar.com"));
        assert_eq!(parsed.subject.as_deref(), Some("Help"));
        assert!(parsed.date.is_some());
        assert!(parsed.body.as_deref().unwrap().contains("I need help"));
    }

    #[test]
    fn test_parse_message_without_sender() {
        let raw = "Subject: No sender\r\n\r\nbody text\r\n";
        let parsed = ParsedInboundEmail::parse(raw).unwrap();

        assert_eq!(parsed.from, None);
        assert_eq!(parsed.subject.as_deref(), Some("No sender"));
    }

    #[test]
    fn test_condensed_body_masks_links_and_dividers() {
        let parsed = ParsedInboundEmail {
            body: Some(
                "see https://example.com/path?a=1\n\n----------\nthanks".to_string(),
            ),
            ..Default::default()
        };

        let condensed = parsed.condensed_body().unwrap();
        assert!(condensed.contains("[LINK]"));
        assert!(!condensed.contains("https://"));
        assert!(!condensed.contains("----"));
        assert!(!condensed.contains('\n'));
    }

    #[test]
    fn test_subject_whitespace_is_collapsed() {
        let raw = "Subject: a\tvery\r\n spaced   subject\r\n\r\nbody\r\n";
        let parsed = ParsedInboundEmail::parse(raw).unwrap();

        assert_eq!(parsed.subject.as_deref(), Some("a very spaced subject"));
    }
}
