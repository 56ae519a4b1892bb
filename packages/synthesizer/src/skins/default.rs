use super::{host_of, push_line, push_markdown, rule, Skin, SkinId, SkinView};

/// Plain result cards.
pub struct DefaultSkin;

fn card_title(url: Option<&str>, n: u8) -> String {
    match url.and_then(host_of) {
        Some(host) => format!("Summary of {}", host),
        None => format!("Summary of Source {}", n),
    }
}

impl Skin for DefaultSkin {
    fn id(&self) -> SkinId {
        SkinId::Default
    }

    fn render(&self, view: &SkinView<'_>) -> String {
        let mut out = String::new();

        let cards = [
            (card_title(view.url1, 1), view.result.summary1.as_deref()),
            (card_title(view.url2, 2), view.result.summary2.as_deref()),
            (
                "Synthesis of Both Sources".to_string(),
                view.result.synthesis.as_deref(),
            ),
        ];

        for (title, body) in cards {
            let Some(body) = body else { continue };
            push_line(&mut out, &title);
            push_line(&mut out, rule('-', title.chars().count()));
            push_markdown(&mut out, body, "");
            out.push('\n');
        }

        out
    }
}
