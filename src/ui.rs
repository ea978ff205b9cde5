use crate::codec::{ControlSink, RawInputProvider};
use crate::schema::{
    CheckboxGroupField, ControlKind, FieldDescriptor, FieldKind, FieldSchema, RadioField,
    RawValue, SelectField, SliderField, TextField,
};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// State of every control on the rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormView {
    values: BTreeMap<String, RawValue>,
}

impl FormView {
    /// Controls as a freshly reset form shows them.
    pub fn with_defaults(schema: &FieldSchema) -> Self {
        let values = schema
            .iter()
            .filter_map(|field| {
                field
                    .encode_default_for_display()
                    .map(|raw| (field.name.clone(), raw))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.values.get(field)
    }

    fn scalar(&self, field: &str) -> Option<&str> {
        match self.values.get(field)? {
            RawValue::Scalar(value) => Some(value),
            RawValue::Selection(_) => None,
        }
    }

    fn is_checked(&self, field: &str, key: &str) -> bool {
        match self.values.get(field) {
            Some(RawValue::Selection(keys)) => keys.iter().any(|checked| checked == key),
            Some(RawValue::Scalar(value)) => value == key,
            None => false,
        }
    }
}

impl ControlSink for FormView {
    fn set_raw(&mut self, field: &str, _control: ControlKind, raw: RawValue) {
        self.values.insert(field.to_string(), raw);
    }
}

impl RawInputProvider for FormView {
    fn raw_value(&self, field: &str, control: ControlKind) -> Option<RawValue> {
        match self.values.get(field) {
            Some(raw) => Some(raw.clone()),
            // A checkbox group with nothing checked still exists on the page.
            None if control == ControlKind::CheckboxGroup => Some(RawValue::Selection(Vec::new())),
            None => None,
        }
    }
}

/// Decoded `application/x-www-form-urlencoded` body of a form post.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    pairs: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl RawInputProvider for FormSubmission {
    fn raw_value(&self, field: &str, control: ControlKind) -> Option<RawValue> {
        let mut values = self
            .pairs
            .iter()
            .filter(|(name, _)| name == field)
            .map(|(_, value)| value.clone());
        match control {
            // Browsers omit unchecked boxes, so an empty group posts nothing.
            ControlKind::CheckboxGroup => Some(RawValue::Selection(values.collect())),
            _ => values.next().map(RawValue::Scalar),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub action: &'a str,
    pub user_display: &'a str,
    pub user_title: &'a str,
    pub api_base_url: &'a str,
    pub notice: Option<&'a str>,
}

pub fn render_index(schema: &FieldSchema, view: &FormView, page: &PageContext<'_>) -> String {
    let notice = page
        .notice
        .map(|text| format!(r#"<div class="status" data-type="ok">{}</div>"#, escape_html(text)))
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{FORM}}", &render_form(schema, view, page.action))
        .replace("{{NOTICE}}", &notice)
        .replace("{{USER}}", &escape_html(page.user_display))
        .replace("{{USER_TITLE}}", &escape_html(page.user_title))
        .replace("{{BACKEND}}", &escape_html(page.api_base_url))
}

pub fn render_form(schema: &FieldSchema, view: &FormView, action: &str) -> String {
    let mut html = format!(
        r#"<form id="healthForm" method="post" action="{}">"#,
        escape_html(action)
    );
    for field in schema.iter() {
        html.push_str(&render_field(field, view));
    }
    html.push_str(r#"<button type="submit" class="submit-button">Save Daily Entry</button></form>"#);
    html
}

fn render_field(field: &FieldDescriptor, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let mut html = format!(r#"<div class="form-group" id="field-{name}">"#);
    let class = if field.required { r#" class="required""# } else { "" };
    let _ = write!(
        html,
        r#"<label for="{name}"{class}>{}</label>"#,
        escape_html(&field.label)
    );

    let control = match &field.kind {
        FieldKind::Slider(slider) => render_slider(field, slider, view),
        FieldKind::Select(select) => render_select(field, select, view),
        FieldKind::Radio(radio) => render_radio(field, radio, view),
        FieldKind::CheckboxGroup(group) => render_checkboxes(field, group, view),
        FieldKind::Text(text) => render_text(field, text, view),
    };
    html.push_str(&control);
    html.push_str("</div>");
    html
}

fn required_attr(field: &FieldDescriptor) -> &'static str {
    if field.required { " required" } else { "" }
}

fn render_slider(field: &FieldDescriptor, slider: &SliderField, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let fallback = slider.default.unwrap_or(slider.min).to_string();
    let value = escape_html(view.scalar(&field.name).unwrap_or(&fallback));
    let mut html = format!(
        r#"<div><input type="range" id="{name}" name="{name}" min="{}" max="{}" value="{value}"{}>"#,
        slider.min,
        slider.max,
        required_attr(field)
    );
    if let Some((low, high)) = &slider.scale_labels {
        let _ = write!(
            html,
            r#"<div class="scale-labels"><span>{}</span><span>{}</span></div>"#,
            escape_html(low),
            escape_html(high)
        );
    }
    let _ = write!(
        html,
        r#"<div class="value-display">Current: <span id="{name}Value">{value}</span></div></div>"#
    );
    html
}

fn render_select(field: &FieldDescriptor, select: &SelectField, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let current = view.scalar(&field.name);
    let mut html = format!(r#"<select id="{name}" name="{name}"{}>"#, required_attr(field));
    for option in &select.options {
        let selected = if current == Some(option.key.as_str()) { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{}"{selected}>{}</option>"#,
            escape_html(&option.key),
            escape_html(&option.label)
        );
    }
    html.push_str("</select>");
    html
}

fn render_radio(field: &FieldDescriptor, radio: &RadioField, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let mut html = String::from(r#"<div class="radio-group">"#);
    for option in &radio.options {
        let checked = if view.is_checked(&field.name, &option.key) { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<label><input type="radio" name="{name}" value="{}"{checked}{}>{}</label><br>"#,
            escape_html(&option.key),
            required_attr(field),
            escape_html(&option.label)
        );
    }
    html.push_str("</div>");
    html
}

fn render_checkboxes(field: &FieldDescriptor, group: &CheckboxGroupField, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let mut html = format!(r#"<div class="checkbox-group" id="{name}">"#);
    for category in &group.categories {
        let _ = write!(
            html,
            r#"<fieldset class="checkbox-category"><legend>{}</legend>"#,
            escape_html(&category.name)
        );
        for option in &category.options {
            let checked = if view.is_checked(&field.name, &option.key) { " checked" } else { "" };
            let title = if option.long.is_empty() { &option.short } else { &option.long };
            let _ = write!(
                html,
                r#"<label title="{}"><input type="checkbox" name="{name}" value="{}"{checked}>{}</label>"#,
                escape_html(title),
                escape_html(&option.key),
                escape_html(&option.short)
            );
        }
        html.push_str("</fieldset>");
    }
    html.push_str("</div>");
    html
}

fn render_text(field: &FieldDescriptor, text: &TextField, view: &FormView) -> String {
    let name = escape_html(&field.name);
    let placeholder = text
        .placeholder
        .as_deref()
        .map(|value| format!(r#" placeholder="{}""#, escape_html(value)))
        .unwrap_or_default();
    format!(
        r#"<textarea id="{name}" name="{name}" rows="4"{placeholder}{}>{}</textarea>"#,
        required_attr(field),
        escape_html(view.scalar(&field.name).unwrap_or_default())
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily Health Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .form-group {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 10px;
      margin-bottom: 16px;
    }

    .form-group > label {
      font-weight: 600;
    }

    label.required::after {
      content: " *";
      color: var(--accent);
    }

    .scale-labels {
      display: flex;
      justify-content: space-between;
      font-size: 0.85rem;
      color: #8b857d;
    }

    .value-display {
      color: var(--accent-2);
    }

    .checkbox-category {
      border: none;
      display: flex;
      flex-wrap: wrap;
      gap: 8px 16px;
      padding: 0;
      margin: 0 0 10px;
    }

    .checkbox-category legend {
      text-transform: uppercase;
      letter-spacing: 0.12em;
      font-size: 0.8rem;
      color: #8b857d;
    }

    textarea {
      width: 100%;
      font: inherit;
    }

    .submit-button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 16px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(255, 107, 74, 0.3);
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    footer {
      font-size: 0.85rem;
      color: #6f6a65;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Daily Health Tracker</h1>
    </header>
    {{NOTICE}}
    {{FORM}}
    <footer>
      User: <span id="footer-userid" title="{{USER_TITLE}}">{{USER}}</span>
      &middot; Backend: <span id="footer-backend-url" title="Backend URL: {{BACKEND}}">{{BACKEND}}</span>
    </footer>
  </main>

  <script>
    document.querySelectorAll('input[type="range"]').forEach((slider) => {
      const display = document.getElementById(`${slider.id}Value`);
      slider.addEventListener('input', () => {
        if (display) {
          display.textContent = slider.value;
        }
      });
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::health_schema;
    use crate::codec::{collect, restore};
    use crate::schema::FieldValue;

    fn page() -> PageContext<'static> {
        PageContext {
            action: "/entries?uid=abc",
            user_display: "abc",
            user_title: "Full User ID: abc",
            api_base_url: "http://localhost:8000",
            notice: None,
        }
    }

    #[test]
    fn defaults_are_checked_and_selected() {
        let schema = health_schema().unwrap();
        let html = render_index(&schema, &FormView::with_defaults(&schema), &page());

        assert!(html.contains(r#"<input type="range" id="mood" name="mood" min="0" max="10" value="5" required>"#));
        assert!(html.contains(r#"value="none" checked required>None.</label>"#));
        assert!(html.contains(r#"<option value="0" selected>0 - None</option>"#));
        assert!(html.contains(r#"value="reading">Reading</label>"#));
        assert!(html.contains(r#"action="/entries?uid=abc""#));
        assert!(html.contains("Save Daily Entry"));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_html(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn restored_view_renders_and_collects_stored_values() {
        let schema = health_schema().unwrap();
        let submission = FormSubmission::new(vec![
            ("mood".into(), "8".into()),
            ("allergy_state".into(), "face".into()),
            ("daily_activities".into(), "gaming".into()),
            ("daily_activities".into(), "friends".into()),
            ("daily_comments".into(), " <ok> ".into()),
        ]);
        let record = collect(&schema, &submission);

        let mut view = FormView::with_defaults(&schema);
        restore(&schema, &record, &mut view);
        let html = render_form(&schema, &view, "/entries");
        assert!(html.contains(r#"value="face" checked required>"#));
        assert!(html.contains(r#"value="gaming" checked>"#));
        assert!(html.contains("&lt;ok&gt;</textarea>"));

        let again = collect(&schema, &view);
        assert_eq!(again.value("mood"), Some(&FieldValue::Int(8)));
        assert_eq!(again.value("allergy_state"), Some(&FieldValue::Int(2)));
        assert_eq!(again.value("daily_activities"), record.value("daily_activities"));
        assert_eq!(again.value("daily_comments"), Some(&FieldValue::Text("<ok>".into())));
    }

    #[test]
    fn submission_without_checked_boxes_is_all_zero() {
        let schema = health_schema().unwrap();
        let record = collect(&schema, &FormSubmission::default());
        let Some(FieldValue::Flags(flags)) = record.value("daily_activities") else {
            panic!("expected flags");
        };
        assert!(flags.values().all(|bit| *bit == 0));
        assert_eq!(record.value("mood"), None);
    }
}
