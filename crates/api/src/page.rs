use coffee_risk_core::analysis::Assessment;
use coffee_risk_core::domain::{CropStage, WeatherReading};
use coffee_risk_core::RiskError;
use std::fmt::Write;

pub const TITLE: &str = "Coffee Disease Risk Prediction";
const INTRO: &str =
    "Enter the weather and farm details below to assess the risk of Coffee Leaf Rust.";

/// Values shown in the form inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub wind_speed: f64,
    pub crop_stage: String,
}

impl Default for FormValues {
    fn default() -> Self {
        let reading = WeatherReading::default();
        Self {
            temperature: reading.avg_temperature,
            humidity: reading.humidity_percent,
            rainfall: reading.rainfall_mm,
            wind_speed: reading.wind_speed_mps,
            crop_stage: CropStage::Flowering.label().to_string(),
        }
    }
}

pub enum Outcome<'a> {
    Verdict(&'a Assessment),
    Failed(&'a RiskError),
}

pub fn render(values: &FormValues, outcome: Option<Outcome<'_>>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>☕ {TITLE}</title>");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>☕ {TITLE}</h1>\n<p>{INTRO}</p>");

    html.push_str("<form method=\"post\" action=\"/analyze\">\n<h2>Current Weather Conditions</h2>\n");
    number_input(&mut html, "temperature", "Average Temperature (°C)", values.temperature);
    number_input(&mut html, "humidity", "Humidity (%)", values.humidity);
    number_input(&mut html, "rainfall", "Rainfall (mm)", values.rainfall);
    number_input(&mut html, "wind_speed", "Wind Speed (m/s)", values.wind_speed);

    html.push_str("<label for=\"crop_stage\">Crop Stage</label>\n<select id=\"crop_stage\" name=\"crop_stage\">\n");
    for stage in CropStage::ALL {
        let selected = if stage.label() == values.crop_stage {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<option value=\"{label}\"{selected}>{label}</option>",
            label = escape(stage.label())
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Analyze Risk Level</button>\n</form>\n");

    match outcome {
        Some(Outcome::Verdict(assessment)) => {
            let _ = writeln!(
                html,
                "<section class=\"verdict {color}\" data-tier=\"{tier}\">\n<h2>{headline}</h2>\n<p>{advisory}</p>\n</section>",
                color = assessment.indicator,
                tier = assessment.verdict.tier,
                headline = escape(&assessment.headline),
                advisory = escape(&assessment.advisory),
            );
        }
        Some(Outcome::Failed(err)) => {
            let _ = writeln!(
                html,
                "<section class=\"verdict error\" data-kind=\"{kind}\">\n<h2>Analysis failed</h2>\n<pre>{message}</pre>\n</section>",
                kind = err.kind(),
                message = escape(&err.to_string()),
            );
        }
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn number_input(html: &mut String, name: &str, label: &str, value: f64) {
    let _ = writeln!(
        html,
        "<label for=\"{name}\">{label}</label>\n<input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" value=\"{value:?}\">"
    );
}

/// Error messages can echo user input back.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"<style>
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
label, input, select, button { display: block; margin: 0.4rem 0; }
.verdict { padding: 1rem; border-radius: 0.4rem; margin-top: 1.5rem; }
.verdict.green { background: #e6f4ea; color: #137333; }
.verdict.yellow { background: #fef7e0; color: #b06000; }
.verdict.red { background: #fce8e6; color: #c5221f; }
.verdict.error { background: #f1f3f4; color: #3c4043; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_page_has_defaults_and_all_stages() {
        let html = render(&FormValues::default(), None);
        assert!(html.contains(TITLE));
        assert!(html.contains("name=\"temperature\" value=\"22.0\""));
        assert!(html.contains("name=\"humidity\" value=\"70.0\""));
        assert!(html.contains("name=\"rainfall\" value=\"5.0\""));
        assert!(html.contains("name=\"wind_speed\" value=\"2.0\""));
        for stage in CropStage::ALL {
            assert!(html.contains(&format!("<option value=\"{}\"", stage.label())));
        }
        assert!(html.contains("<option value=\"Flowering\" selected>"));
        assert!(!html.contains("class=\"verdict"));
    }

    #[test]
    fn form_defaults_follow_reading_defaults() {
        let values = FormValues::default();
        let reading = WeatherReading::default();
        assert_eq!(values.temperature, reading.avg_temperature);
        assert_eq!(values.humidity, reading.humidity_percent);
        assert_eq!(values.rainfall, reading.rainfall_mm);
        assert_eq!(values.wind_speed, reading.wind_speed_mps);
    }

    #[test]
    fn error_text_is_escaped() {
        let err = RiskError::schema_mismatch("CropStage", "unknown category \"<script>\"");
        let html = render(&FormValues::default(), Some(Outcome::Failed(&err)));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("data-kind=\"schema_mismatch\""));
    }
}
