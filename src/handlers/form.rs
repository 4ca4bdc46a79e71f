//! HTML input form
//!
//! One numeric input per schema slot, submitted as a GET to /predict.

use axum::{extract::State, response::Html};

use crate::features::FeatureKind;
use crate::AppState;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut inputs = String::new();

    for slot in state.schema.slots() {
        let name = escape(&slot.name);
        let attrs = match slot.kind {
            FeatureKind::Numeric => r#"step="any""#,
            FeatureKind::NonNegative => r#"step="any" min="0""#,
            FeatureKind::Flag => r#"step="1" min="0" max="1""#,
        };
        let required = if slot.required { " required" } else { "" };

        inputs.push_str(&format!(
            "      <label>{name}\n        <input type=\"number\" name=\"{name}\" {attrs}{required}>\n      </label>\n"
        ));
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title} prediction</title>
  </head>
  <body>
    <h1>{title} prediction</h1>
    <form method="get" action="/predict">
{inputs}      <button type="submit">Predict</button>
    </form>
  </body>
</html>
"#,
        title = escape(state.schema.name()),
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
