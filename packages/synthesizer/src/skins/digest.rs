use super::{push_line, push_markdown, read_minutes, Skin, SkinId, SkinView};
use crate::topics::split_attribution;

/// Executive summary, table of contents, then each topic.
pub struct DigestSkin;

fn points(n: usize) -> String {
    if n == 1 {
        "1 point".to_string()
    } else {
        format!("{} points", n)
    }
}

impl Skin for DigestSkin {
    fn id(&self) -> SkinId {
        SkinId::Digest
    }

    fn render(&self, view: &SkinView<'_>) -> String {
        let mut out = String::new();
        let parsed = view.parsed();

        push_line(&mut out, view.title_or("Content Digest"));
        out.push('\n');

        let executive: Vec<&str> = parsed.bullets().take(3).collect();
        if !executive.is_empty() {
            push_line(&mut out, "Executive Summary");
            for bullet in executive {
                push_line(&mut out, format!("  • {}", split_attribution(bullet).1));
            }
            out.push('\n');
        }

        if !parsed.topics.is_empty() {
            push_line(&mut out, "CONTENTS");
            for (i, topic) in parsed.topics.iter().enumerate() {
                push_line(
                    &mut out,
                    format!("  {}. {} ({})", i + 1, topic.title, points(topic.bullets.len())),
                );
            }
            out.push('\n');
        }

        let summaries = [
            ("Article Summary", view.result.summary1.as_deref()),
            ("Discussion Summary", view.result.summary2.as_deref()),
        ];
        for (label, summary) in summaries {
            let Some(summary) = summary else { continue };
            push_line(
                &mut out,
                format!("{} ({} min read)", label, read_minutes(summary)),
            );
            push_markdown(&mut out, summary, "  ");
            out.push('\n');
        }

        for (i, topic) in parsed.topics.iter().enumerate() {
            push_line(&mut out, format!("{}. {}", i + 1, topic.title));
            for bullet in &topic.bullets {
                match split_attribution(bullet) {
                    (Some(source), text) => push_line(&mut out, format!("  • [{}] {}", source, text)),
                    (None, text) => push_line(&mut out, format!("  • {}", text)),
                }
            }
            out.push('\n');
        }

        if let Some(synthesis) = &view.result.synthesis {
            push_line(&mut out, format!("Full synthesis: {} min read", read_minutes(synthesis)));
        }

        out
    }
}
