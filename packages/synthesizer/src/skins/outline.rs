use super::{push_line, push_markdown, Skin, SkinId, SkinView};

/// Numbered outline.
pub struct OutlineSkin;

pub(crate) fn roman(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// A..Z, then AA, AB, ...
pub(crate) fn letter(mut n: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.iter().rev().collect()
}

impl Skin for OutlineSkin {
    fn id(&self) -> SkinId {
        SkinId::Outline
    }

    fn render(&self, view: &SkinView<'_>) -> String {
        let mut out = String::new();
        let parsed = view.parsed();

        push_line(&mut out, view.title_or("Synthesis Outline"));
        if let Some(headline) = &parsed.headline {
            push_line(&mut out, format!("  {}", headline));
        }
        out.push('\n');

        let summaries = [
            ("Article Summary", view.result.summary1.as_deref()),
            ("Discussion Summary", view.result.summary2.as_deref()),
        ];
        for (label, summary) in summaries {
            let Some(summary) = summary else { continue };
            push_line(&mut out, format!("* {}", label));
            push_markdown(&mut out, summary, "  ");
            out.push('\n');
        }

        for (i, topic) in parsed.topics.iter().enumerate() {
            push_line(&mut out, format!("{}. {}", roman(i + 1), topic.title));
            for (j, bullet) in topic.bullets.iter().enumerate() {
                push_line(&mut out, format!("   {}. {}", letter(j), bullet));
            }
            out.push('\n');
        }

        let sources: Vec<&str> = [view.url1, view.url2].into_iter().flatten().collect();
        if !sources.is_empty() {
            push_line(&mut out, "Sources");
            for (i, url) in sources.iter().enumerate() {
                push_line(&mut out, format!("  [{}] {}", i + 1, url));
            }
        }

        out
    }
}
