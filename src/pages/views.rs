//! Page bodies. Every value interpolated here is escaped.

use time::{macros::format_description, OffsetDateTime};

use super::html_escape;
use crate::model::Diagnosis;

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| ts.to_string())
}

/// What the result card on the home page needs.
pub struct PredictionView {
    pub diagnosis: Diagnosis,
    pub image_url: String,
}

/// One row of the history table.
pub struct HistoryRow {
    pub image_url: String,
    pub result: String,
    pub created_at: OffsetDateTime,
}

const UPLOAD_FORM: &str = r#"<form action="/predict" method="post" enctype="multipart/form-data">
        <label for="imagefile">Chest X-ray image</label>
        <input type="file" id="imagefile" name="imagefile" accept="image/*" required>
        <button type="submit">Analyze</button>
    </form>"#;

pub fn home(logged_in: bool, prediction: Option<&PredictionView>) -> String {
    let action = if logged_in {
        UPLOAD_FORM.to_string()
    } else {
        r#"<p><a href="/login">Log in</a> or <a href="/signup">create an account</a> to analyze an X-ray.</p>"#
            .to_string()
    };

    let result = prediction
        .map(|p| {
            let class = if p.diagnosis.positive {
                "result-positive"
            } else {
                "result-negative"
            };
            format!(
                r#"<section class="result">
        <h2 class="{class}">{label}</h2>
        <p>Confidence: {confidence:.2}%</p>
        <img class="scan" src="{src}" alt="Uploaded X-ray">
        <p><a href="/generate-pdf">Download PDF report</a></p>
    </section>"#,
                class = class,
                label = html_escape(p.diagnosis.label()),
                confidence = p.diagnosis.confidence,
                src = html_escape(&p.image_url),
            )
        })
        .unwrap_or_default();

    format!(
        r#"<h1>Pneumonia detection from chest X-rays</h1>
    <p>Upload a chest radiograph and a pretrained convolutional network estimates whether it shows signs of pneumonia.</p>
    {action}
    {result}"#
    )
}

pub fn login() -> String {
    r#"<h1>Log in</h1>
    <form action="/login" method="post">
        <label>Username <input type="text" name="username" required></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit">Log in</button>
    </form>
    <p>No account yet? <a href="/signup">Sign up</a>.</p>"#
        .to_string()
}

pub fn signup() -> String {
    r#"<h1>Sign up</h1>
    <form action="/signup" method="post">
        <label>Username <input type="text" name="username" minlength="3" maxlength="150" required></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit">Create account</button>
    </form>
    <p>Already registered? <a href="/login">Log in</a>.</p>"#
        .to_string()
}

pub fn history(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return r#"<h1>Prediction history</h1>
    <p>No predictions yet. <a href="/predict">Analyze an X-ray</a>.</p>"#
            .to_string();
    }

    let body: String = rows
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td><img class="thumb" src="{}" alt="X-ray"></td><td>{}</td><td>{}</td></tr>"#,
                html_escape(&r.image_url),
                html_escape(&r.result),
                format_timestamp(r.created_at),
            )
        })
        .collect();

    format!(
        r#"<h1>Prediction history</h1>
    <table>
        <thead><tr><th>Image</th><th>Result</th><th>Date</th></tr></thead>
        <tbody>{body}</tbody>
    </table>"#
    )
}

pub fn about() -> String {
    r#"<h1>About</h1>
    <p>PneumoScan classifies chest X-ray images as showing pneumonia or not, using a convolutional neural network trained on labelled radiographs.</p>
    <p>Results are a screening aid and not a medical diagnosis.</p>"#
        .to_string()
}

pub fn contact() -> String {
    r#"<h1>Contact us</h1>
    <form action="/contact_submit" method="post">
        <label>Name <input type="text" name="name" required></label>
        <label>Email <input type="email" name="email" required></label>
        <label>Message <textarea name="message" required></textarea></label>
        <button type="submit">Send</button>
    </form>"#
        .to_string()
}

pub fn doctors() -> String {
    r#"<h1>Find a doctor</h1>
    <p>If your result is positive, or you have fever, cough or shortness of breath, contact a pulmonologist or your general practitioner.</p>
    <ul>
        <li>Pulmonology: chest and lung specialists</li>
        <li>Radiology: second reading of your X-ray</li>
        <li>General practice: first point of care and referrals</li>
    </ul>"#
        .to_string()
}
