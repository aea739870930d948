// Body rendering — personalized blocks to the HTML and plain-text parts the
// provider needs.
//
// Plain output: no styling, one element per block.
// Every piece of user-supplied text is escaped.

use crate::broadcast::compose::MessageBody;
use crate::broadcast::MessageBlock;

/// Render the HTML part of a message.
pub fn to_html(body: &MessageBody) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>");

    // Hidden preheader: what inbox list views show next to the subject
    html.push_str(&format!(
        "<div style=\"display:none;max-height:0;overflow:hidden\">{}</div>",
        escape(&body.preview_text)
    ));

    if let Some(url) = body.image_url.as_deref().filter(|u| !u.is_empty()) {
        html.push_str(&format!("<img src=\"{}\" alt=\"\">", escape(url)));
    }

    for block in &body.blocks {
        match block {
            MessageBlock::Text { content, .. } => {
                let paragraphs: Vec<String> = content.lines().map(escape).collect();
                html.push_str(&format!("<p>{}</p>", paragraphs.join("<br>")));
            }
            MessageBlock::Button { content, link, .. } => {
                if let Some(link) = link {
                    html.push_str(&format!(
                        "<p><a href=\"{}\" class=\"button\">{}</a></p>",
                        escape(link),
                        escape(content)
                    ));
                }
            }
            MessageBlock::Image { content, link, .. } => {
                let img = format!("<img src=\"{}\" alt=\"\">", escape(content));
                match link {
                    Some(link) => {
                        html.push_str(&format!("<a href=\"{}\">{img}</a>", escape(link)))
                    }
                    None => html.push_str(&img),
                }
            }
            MessageBlock::Link { content, link, .. } => {
                if let Some(link) = link {
                    let label = if content.is_empty() { link } else { content };
                    html.push_str(&format!(
                        "<p><a href=\"{}\">{}</a></p>",
                        escape(link),
                        escape(label)
                    ));
                }
            }
        }
    }

    html.push_str("</body></html>");
    html
}

/// Render the plain-text part of a message.
pub fn to_text(body: &MessageBody) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in &body.blocks {
        match block {
            MessageBlock::Text { content, .. } => parts.push(content.clone()),
            MessageBlock::Button { content, link, .. } | MessageBlock::Link { content, link, .. } => {
                match (content.is_empty(), link) {
                    (_, None) => {}
                    (true, Some(link)) => parts.push(link.clone()),
                    (false, Some(link)) => parts.push(format!("{content}: {link}")),
                }
            }
            MessageBlock::Image { .. } => {}
        }
    }
    parts.join("\n\n")
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
