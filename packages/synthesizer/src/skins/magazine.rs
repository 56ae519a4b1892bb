use super::{push_line, push_markdown, rule, Skin, SkinId, SkinView};

const WIDTH: usize = 60;

/// Editorial layout.
pub struct MagazineSkin;

fn section(out: &mut String, label: &str) {
    let pad = WIDTH.saturating_sub(label.len() + 2) / 2;
    push_line(out, format!("{} {} {}", rule('=', pad), label, rule('=', pad)));
}

impl Skin for MagazineSkin {
    fn id(&self) -> SkinId {
        SkinId::Magazine
    }

    fn render(&self, view: &SkinView<'_>) -> String {
        let mut out = String::new();

        push_line(&mut out, "EXCLUSIVE ANALYSIS");
        push_line(&mut out, view.title_or("Technology Deep Dive"));
        push_line(&mut out, rule('=', WIDTH));
        out.push('\n');

        if let Some(summary) = &view.result.summary1 {
            section(&mut out, "THE ARTICLE");
            push_markdown(&mut out, summary, "  ");
            out.push('\n');
        }
        if let Some(summary) = &view.result.summary2 {
            section(&mut out, "COMMUNITY VOICE");
            push_markdown(&mut out, summary, "  | ");
            out.push('\n');
        }
        if let Some(synthesis) = &view.result.synthesis {
            section(&mut out, "FEATURE STORY");
            push_markdown(&mut out, synthesis, "");
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunResult;

    #[test]
    fn test_sections() {
        let result = RunResult {
            summary1: Some("• a".into()),
            summary2: Some("• b".into()),
            synthesis: Some("# Head\n## TOPIC FOLLOWS: T\n• p".into()),
        };
        let mut view = SkinView::new(&result);
        view.hn_title = Some("Show HN: thing");

        let out = MagazineSkin.render(&view);

        assert!(out.contains("Show HN: thing"));
        let article = out.find("THE ARTICLE").unwrap();
        let voice = out.find("COMMUNITY VOICE").unwrap();
        let feature = out.find("FEATURE STORY").unwrap();
        assert!(article < voice && voice < feature);
    }

    #[test]
    fn test_fallback_title() {
        let result = RunResult::default();
        let out = MagazineSkin.render(&SkinView::new(&result));
        assert!(out.contains("Technology Deep Dive"));
        assert!(!out.contains("THE ARTICLE"));
    }
}
