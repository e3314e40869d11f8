//! Subjects and bodies of the notifications sent by the monitor

use crate::util::format_usd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// First successful sample, confirms the pipeline works end-to-end
    Baseline,
    /// The relative change crossed the threshold
    Alert,
    /// Periodic sign of life
    Status,
}

/// A message the engine wants delivered to the current recipients
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increased,
    Decreased,
}

impl Trend {
    pub fn from_change(pct_change: f64) -> Self {
        if pct_change > 0.0 {
            Trend::Increased
        } else {
            Trend::Decreased
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Trend::Increased => "increased",
            Trend::Decreased => "decreased",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Trend::Increased => "Increased",
            Trend::Decreased => "Decreased",
        }
    }
}

pub struct MessageBuilder {
    kind: NotificationKind,
    subject: String,
    lines: Vec<String>,
}

impl MessageBuilder {
    pub fn new(kind: NotificationKind, subject: impl ToString) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl ToString) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(self) -> NotificationRequest {
        let mut body = self.lines.join("\n");
        body.push('\n');

        NotificationRequest {
            kind: self.kind,
            subject: self.subject,
            body,
        }
    }
}

pub fn baseline(protocol: &str, current: f64) -> NotificationRequest {
    MessageBuilder::new(NotificationKind::Baseline, "TVL Monitoring Started")
        .line(format!("Monitoring the Total Value Locked (TVL) of {protocol}."))
        .line(format!("Baseline TVL: {}", format_usd(current)))
        .build()
}

pub fn alert(protocol: &str, pct_change: f64, previous: f64, current: f64) -> NotificationRequest {
    let trend = Trend::from_change(pct_change);
    let magnitude = pct_change.abs();

    MessageBuilder::new(
        NotificationKind::Alert,
        format!("TVL Alert: {} by {magnitude:.2}%", trend.title()),
    )
    .line(format!(
        "The Total Value Locked (TVL) of {protocol} has {} by {magnitude:.2}%.",
        trend.as_str()
    ))
    .line(format!("Previous TVL: {}", format_usd(previous)))
    .line(format!("Current TVL: {}", format_usd(current)))
    .build()
}

pub fn status(
    protocol: &str,
    pct_change: Option<f64>,
    threshold: f64,
    previous: f64,
    current: f64,
) -> NotificationRequest {
    match pct_change {
        Some(pct) if pct.abs() < threshold => MessageBuilder::new(
            NotificationKind::Status,
            "TVL Update: No Significant Change",
        )
        .line(format!(
            "The Total Value Locked (TVL) of {protocol} is stable at {}.",
            format_usd(current)
        ))
        .line(format!(
            "No significant change from the previous value of {} ({pct:+.2}%).",
            format_usd(previous)
        ))
        .build(),
        Some(pct) => {
            let trend = Trend::from_change(pct);
            MessageBuilder::new(
                NotificationKind::Status,
                format!("TVL Update: {} by {:.2}%", trend.title(), pct.abs()),
            )
            .line(format!(
                "The Total Value Locked (TVL) of {protocol} is {}.",
                format_usd(current)
            ))
            .line(format!(
                "It has {} by {:.2}% from the previous value of {}.",
                trend.as_str(),
                pct.abs(),
                format_usd(previous)
            ))
            .build()
        }
        None => MessageBuilder::new(NotificationKind::Status, "TVL Update")
            .line(format!(
                "The Total Value Locked (TVL) of {protocol} is {}.",
                format_usd(current)
            ))
            .line(format!(
                "The previous value was {}, no relative change can be computed.",
                format_usd(previous)
            ))
            .build(),
    }
}
