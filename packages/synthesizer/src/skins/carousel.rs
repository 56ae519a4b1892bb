use super::{push_line, push_markdown, rule, Skin, SkinId, SkinView};
use crate::topics::bullet_lines;

/// One slide per topic, preceded by an at-a-glance slide.
pub struct CarouselSkin;

struct Slide {
    title: String,
    lines: Vec<String>,
}

impl Skin for CarouselSkin {
    fn id(&self) -> SkinId {
        SkinId::Carousel
    }

    fn render(&self, view: &SkinView<'_>) -> String {
        let mut out = String::new();
        let parsed = view.parsed();

        let mut slides = Vec::new();
        if view.result.summary1.is_some() || view.result.summary2.is_some() {
            let mut lines = Vec::new();
            let groups = [
                ("Article", view.result.summary1.as_deref()),
                ("HN Discussion", view.result.summary2.as_deref()),
            ];
            for (label, summary) in groups {
                let Some(summary) = summary else { continue };
                lines.push(format!("{}:", label));
                lines.extend(bullet_lines(summary).into_iter().map(|b| format!("  • {}", b)));
            }
            slides.push(Slide {
                title: "At-a-Glance".to_string(),
                lines,
            });
        }
        for topic in &parsed.topics {
            slides.push(Slide {
                title: topic.title.clone(),
                lines: topic.bullets.iter().map(|b| format!("• {}", b)).collect(),
            });
        }
        if !parsed.provenance.is_empty() {
            slides.push(Slide {
                title: "Provenance".to_string(),
                lines: bullet_lines(&parsed.provenance.join("\n"))
                    .into_iter()
                    .map(|b| format!("• {}", b))
                    .collect(),
            });
        }

        push_line(&mut out, view.title_or("Topic Carousel"));
        out.push('\n');

        if slides.is_empty() {
            if let Some(synthesis) = &view.result.synthesis {
                push_markdown(&mut out, synthesis, "");
            }
            return out;
        }

        let total = slides.len();
        for (i, slide) in slides.iter().enumerate() {
            push_line(&mut out, format!("[{}/{}] {}", i + 1, total, slide.title));
            push_line(&mut out, rule('─', 40));
            for line in &slide.lines {
                push_line(&mut out, line);
            }
            out.push('\n');
        }

        out
    }
}
