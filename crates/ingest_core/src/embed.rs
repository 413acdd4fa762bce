/// Where the chat widget script lives and which API it should talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub widget_url: String,
    pub api_base: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        let api_base = "http://localhost:8000".to_string();
        Self {
            widget_url: format!("{api_base}/static/widget.js"),
            api_base,
        }
    }
}

/// HTML snippet that embeds the chat widget for `collection`.
pub fn render_embed_snippet(config: &WidgetConfig, collection: &str) -> String {
    format!(
        r#"<script src="{}" data-collection="{}" data-api="{}" defer></script>"#,
        escape_attr(&config.widget_url),
        escape_attr(collection),
        escape_attr(&config.api_base),
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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
