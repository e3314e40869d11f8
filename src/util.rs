const SMTP_EMAIL: &str = "SMTP_EMAIL";

const SMTP_PASSWORD: &str = "SMTP_PASSWORD";

pub fn get_smtp_credentials() -> Option<(String, String)> {
    let email = std::env::var(SMTP_EMAIL).ok()?;
    let password = std::env::var(SMTP_PASSWORD).ok()?;
    Some((email, password))
}

const SMTP_SERVER: &str = "SMTP_SERVER";

pub fn get_smtp_server() -> Option<String> {
    std::env::var(SMTP_SERVER).ok()
}

const SMTP_PORT: &str = "SMTP_PORT";

pub fn get_smtp_port() -> Option<u16> {
    let port_from_env = std::env::var(SMTP_PORT);
    port_from_env.ok().and_then(|res| res.parse().ok())
}

const APPS_SCRIPT_API_URL: &str = "APPS_SCRIPT_API_URL";

pub fn get_directory_url() -> Option<String> {
    std::env::var(APPS_SCRIPT_API_URL).ok()
}

/// Render a dollar amount with thousands separators and two decimals,
/// e.g. `1050000.0` becomes `$1,050,000.00`.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}
