use std::fmt::Write;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const RESULT_SLOT: &str = "{{result}}";

/// What the page shows below the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageResult<'a> {
    Empty,
    Prediction(f32),
    Error(&'a str),
}

pub fn render_index(result: PageResult<'_>) -> String {
    let block = match result {
        PageResult::Empty => String::new(),
        PageResult::Prediction(cost) => format!(
            r#"<section class="result prediction"><h2>Predicted insurance cost</h2><p class="prediction-value">{cost:.2}</p></section>"#
        ),
        PageResult::Error(message) => format!(
            r#"<section class="result error"><h2>Could not predict</h2><p class="error-message">{}</p></section>"#,
            escape_html(message)
        ),
    };
    INDEX_TEMPLATE.replace(RESULT_SLOT, &block)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c if c.is_control() && c != '\n' => {
                let _ = write!(out, "&#{};", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
