//! Single-page question form.
//!
//! `GET /` renders an empty form. `POST /ask` renders the same page with the
//! submitted question kept in the input and one of: a warning for a blank
//! question, the error message, or the answer.

use crate::state::ServerState;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;
use std::sync::Arc;

pub const EMPTY_QUESTION_WARNING: &str = "Please enter a question.";

#[derive(Debug, Default, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Warning(String),
    Error(String),
    Answer(String),
}

pub async fn index() -> Html<String> {
    Html(render_page("", None))
}

pub async fn ask(State(state): State<Arc<ServerState>>, Form(form): Form<AskForm>) -> Html<String> {
    let outcome = if form.question.trim().is_empty() {
        Outcome::Warning(EMPTY_QUESTION_WARNING.to_string())
    } else {
        match super::answer_question(&state, &form.question).await {
            Ok(response) => Outcome::Answer(response.text().to_string()),
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "form question failed");
                Outcome::Error(format!("An error occurred: {err}"))
            }
        }
    };
    Html(render_page(&form.question, Some(&outcome)))
}

pub fn render_page(question: &str, outcome: Option<&Outcome>) -> String {
    let result = match outcome {
        None => String::new(),
        Some(Outcome::Warning(msg)) => {
            format!(r#"<div class="warning">{}</div>"#, encode_text(msg))
        }
        Some(Outcome::Error(msg)) => {
            format!(r#"<div class="error">{}</div>"#, encode_text(msg))
        }
        Some(Outcome::Answer(text)) => format!(
            r#"<h3>&#128196; Answer</h3>
<div class="answer">{}</div>"#,
            encode_text(text)
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Air India Assistant</title>
<style>
body {{ font-family: sans-serif; margin: 2rem 4rem; }}
input[type=text] {{ width: 100%; padding: 0.5rem; }}
.warning {{ background: #fff3cd; padding: 0.75rem; margin-top: 1rem; }}
.error {{ background: #f8d7da; padding: 0.75rem; margin-top: 1rem; }}
.answer {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>&#9992;&#65039; Air India Chat Assistant</h1>
<p>Ask any question about Air India based on the provided documents.</p>
<form method="post" action="/ask">
<label for="question">Enter your question:</label>
<input type="text" id="question" name="question" value="{}">
<button type="submit">Ask</button>
</form>
{}
</body>
</html>
"#,
        encode_double_quoted_attribute(question),
        result
    )
}
