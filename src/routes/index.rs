use crate::error::{Error, Result};
use crate::models::question::FinalMcq;
use crate::services::document_service::extract_text;
use crate::services::mcq_service::normalize_question_count;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Quiz Forge</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; }
textarea { width: 100%; min-height: 12rem; }
.error { color: #b00020; }
ol.options { list-style-type: upper-alpha; }
</style>
</head>
<body>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(body: &str) -> String {
    format!("{}{}{}", PAGE_HEAD, body, PAGE_TAIL)
}

pub fn render_index() -> String {
    page(
        r#"<h1>Generate a quiz</h1>
<form method="post" action="/" enctype="multipart/form-data">
<p><label>Upload .pdf or .txt files<br><input type="file" name="files[]" accept=".pdf,.txt" multiple></label></p>
<p><label>Or paste text<br><textarea name="text"></textarea></label></p>
<p><label>Number of questions <input type="number" name="num_questions" value="5" min="1"></label></p>
<p><button type="submit">Generate</button></p>
</form>
"#,
    )
}

pub fn render_form_created(form_url: &str) -> String {
    let link = match url::Url::parse(form_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => format!(
            r#"<a href="{0}" target="_blank" rel="noopener">{0}</a>"#,
            html_escape(form_url)
        ),
        _ => html_escape(form_url),
    };
    page(&format!(
        "<h1>Your quiz form is ready</h1>\n<p>{}</p>\n<p><a href=\"/\">Generate another</a></p>\n",
        link
    ))
}

pub fn render_questions(mcqs: &[FinalMcq]) -> String {
    let mut body = format!("<h1>Generated {} questions</h1>\n", mcqs.len());
    for mcq in mcqs {
        body.push_str(&format!("<h3>{}</h3>\n<ol class=\"options\">\n", html_escape(&mcq.question)));
        for option in &mcq.options {
            body.push_str(&format!("<li>{}</li>\n", html_escape(option)));
        }
        body.push_str(&format!("</ol>\n<p>Answer: {}</p>\n", mcq.correct_letter));
    }
    body.push_str("<p><a href=\"/\">Generate another</a></p>\n");
    page(&body)
}

pub fn render_error(message: &str) -> String {
    page(&format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>\n",
        html_escape(message)
    ))
}

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn submit(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let mut text_field: Option<String> = None;
    let mut file_texts: Vec<String> = Vec::new();
    let mut saw_file = false;
    let mut num_questions: Option<i64> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files[]" | "files" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                if filename.is_empty() {
                    continue;
                }
                saw_file = true;
                if let Some(text) = extract_text(&filename, data).await? {
                    file_texts.push(text);
                }
            }
            "text" => text_field = Some(field.text().await?),
            "num_questions" => {
                let raw = field.text().await?;
                num_questions = raw.trim().parse::<i64>().ok();
            }
            _ => {}
        }
    }

    let text = if saw_file {
        file_texts.join("\n")
    } else {
        text_field.ok_or_else(|| {
            Error::BadRequest("Provide text or upload at least one .pdf or .txt file".into())
        })?
    };

    let requested = normalize_question_count(num_questions).min(state.max_questions);
    tracing::info!(
        "Quiz request: {} chars of text, {} questions requested",
        text.len(),
        requested
    );
    let mcqs = state.mcq_service.get_mcqs(&text, requested).await;

    if !state.form_service.is_enabled() {
        return Ok(Html(render_questions(&mcqs)).into_response());
    }

    match state.form_service.publish(&mcqs).await {
        Ok(form_url) => Ok(Html(render_form_created(&form_url)).into_response()),
        Err(e) => {
            let message = match e {
                Error::Publish(msg) => msg,
                other => format!("An error occurred: {}", other),
            };
            tracing::error!("Publishing failed: {}", message);
            Ok((StatusCode::BAD_GATEWAY, Html(render_error(&message))).into_response())
        }
    }
}
