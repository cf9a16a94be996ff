//! Page Rendering
//!
//! Pure functions from session state to HTML. Every user action is a form
//! post that applies one event and redirects back here, so the whole page is
//! rebuilt from the session on each interaction.

pub mod theme;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{ChatMessage, ChatRole, Expert, Theme, UploadOutcome, UploadStatus};
use crate::session::Session;

pub const PAGE_TITLE: &str = "Chat with Expert";

/// Full chat page for a live session
pub fn render_page(session: &Session) -> String {
    let base = format!("/sessions/{}", session.id);
    let body = format!(
        r#"<div class="layout">
  <aside class="sidebar">
{sidebar}
  </aside>
  <main class="main">
    <h1>💬 Chat with Expert</h1>
    <h2>Chat with the {label}</h2>
    <form method="post" action="{base}/ask" id="ask-form">
      <label for="question">Ask a question:</label>
      <input type="text" id="question" name="question" autocomplete="off" autofocus />
    </form>
    <p id="thinking">Thinking...</p>
    <div class="chat-container">
{transcript}
    </div>
  </main>
</div>
<script>
  document.getElementById('ask-form').addEventListener('submit', function (e) {{
    if (!document.getElementById('question').value.trim()) {{
      e.preventDefault();
      return;
    }}
    document.getElementById('thinking').style.display = 'block';
  }});
  document.querySelectorAll('[data-autosubmit]').forEach(function (el) {{
    el.addEventListener('change', function () {{ el.form.submit(); }});
  }});
</script>"#,
        sidebar = render_sidebar(session, &base),
        label = encode_text(session.expert.label()),
        base = base,
        transcript = render_transcript(&session.history),
    );

    document(session.theme, &body)
}

fn render_sidebar(session: &Session, base: &str) -> String {
    let mut html = String::new();

    html.push_str("    <h3>Select an Expert</h3>\n");
    html.push_str(&format!(
        "    <form method=\"post\" action=\"{}/expert\">\n      <p>Choose an Expert:</p>\n",
        base
    ));
    for expert in Expert::ALL {
        let checked = if expert == session.expert { " checked" } else { "" };
        html.push_str(&format!(
            "      <label><input type=\"radio\" name=\"expert\" value=\"{}\" data-autosubmit{} /> {}</label><br />\n",
            expert.slug(),
            checked,
            encode_text(expert.label()),
        ));
    }
    html.push_str("      <noscript><button type=\"submit\">Select</button></noscript>\n    </form>\n");

    html.push_str(&format!(
        "    <form method=\"post\" action=\"{}/clear\"><button type=\"submit\">Clear Chat History</button></form>\n",
        base
    ));
    html.push_str(&format!(
        "    <form method=\"post\" action=\"{}/end\"><button type=\"submit\">End Session</button></form>\n",
        base
    ));

    html.push_str("    <h3>Upload a File</h3>\n");
    html.push_str(&format!(
        "    <form method=\"post\" action=\"{}/upload\" enctype=\"multipart/form-data\">\n      \
         <p>Upload PDF, DOC, CSV, etc.</p>\n      \
         <input type=\"file\" name=\"file\" accept=\".pdf,.txt,.docx,.csv\" />\n      \
         <button type=\"submit\">Upload</button>\n    </form>\n",
        base
    ));
    if let Some(status) = &session.upload {
        html.push_str(&render_upload_status(status));
    }

    html.push_str("    <h3>Theme Selection</h3>\n");
    let dark_checked = if session.theme == Theme::Dark { " checked" } else { "" };
    html.push_str(&format!(
        "    <form method=\"post\" action=\"{}/theme\">\n      \
         <label><input type=\"checkbox\" name=\"dark_mode\" value=\"on\" data-autosubmit{} /> Dark Mode</label>\n      \
         <noscript><button type=\"submit\">Apply</button></noscript>\n    </form>\n",
        base, dark_checked
    ));

    html
}

fn render_upload_status(status: &UploadStatus) -> String {
    match &status.outcome {
        UploadOutcome::Summary(summary) => format!(
            "    <p class=\"success\">File uploaded successfully! ({})</p>\n    <h3>Summary</h3>\n    <div class=\"chat-bubble\">{}</div>\n",
            encode_text(&status.filename),
            encode_text(summary)
        ),
        UploadOutcome::Failed(message) => format!(
            "    <p class=\"success\">File uploaded successfully! ({})</p>\n    <p class=\"error\">{}</p>\n",
            encode_text(&status.filename),
            encode_text(message)
        ),
    }
}

fn render_transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_message(message: &ChatMessage) -> String {
    let (align, bg, fg) = match message.role {
        ChatRole::User => ("right", theme::USER_BUBBLE_BG, theme::USER_BUBBLE_FG),
        ChatRole::Assistant => ("left", theme::ASSISTANT_BUBBLE_BG, theme::ASSISTANT_BUBBLE_FG),
    };
    format!(
        "      <div class=\"message {}\" style=\"text-align: {}; background-color: {}; color: {};\">{}</div>",
        role_class(message.role),
        align,
        bg,
        fg,
        encode_text(&message.text)
    )
}

fn role_class(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

/// Shown after "End Session"
pub fn render_ended_page() -> String {
    document(
        Theme::default(),
        r#"<main class="main">
  <h1>Session ended</h1>
  <p>Your chat history has been discarded.</p>
  <p><a href="/">Start a new session</a></p>
</main>"#,
    )
}

/// Error page for the HTML surface, e.g. an unknown or ended session
pub fn render_error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<main class=\"main\">\n  <h1>{}</h1>\n  <p class=\"error\">{}</p>\n  <p><a href=\"/\">Start a new session</a></p>\n</main>",
        encode_text(title),
        encode_text(message)
    );
    document(Theme::default(), &body)
}

fn document(theme: Theme, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <style>{base}</style>
  <style>{theme}</style>
</head>
<body data-theme="{theme_name}">
{body}
</body>
</html>"#,
        title = PAGE_TITLE,
        base = theme::BASE_STYLESHEET,
        theme = theme::stylesheet(theme),
        theme_name = encode_double_quoted_attribute(theme_name(theme)),
        body = body,
    )
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}
