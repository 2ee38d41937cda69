use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl From<String> for Sentiment {
    fn from(value: String) -> Self {
        match value.as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Sentiment::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Summary {
    pub text: String,
    pub style: String,
    pub model_used: String,
    #[serde(default)]
    pub reply_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Email {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub sender_name: Option<String>,
    pub snippet: Option<String>,
    #[serde(default)]
    pub has_attachments: bool,
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_starred: bool,
    pub urgency_score: Option<f64>,
    pub importance_score: Option<f64>,
    pub action_required: Option<bool>,
    pub ai_category: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub received_at: Option<String>,
    pub summary: Option<Summary>,
    // Only present on GET /emails/{id}
    pub body_plain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailListResponse {
    pub emails: Vec<Email>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    #[serde(default)]
    pub message_count: u32,
    pub latest_at: Option<String>,
    pub max_urgency: Option<f64>,
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub snippet: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreadsResponse {
    pub threads: Vec<Thread>,
    pub total: Option<u64>,
}

impl ThreadsResponse {
    /// Server total, or the row count when the server omits it.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.threads.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Balanced,
    Powerful,
    Private,
    Other(String),
}

impl ModelTier {
    pub fn as_str(&self) -> &str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Balanced => "balanced",
            ModelTier::Powerful => "powerful",
            ModelTier::Private => "private",
            ModelTier::Other(s) => s,
        }
    }
}

impl From<String> for ModelTier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "fast" => ModelTier::Fast,
            "balanced" => ModelTier::Balanced,
            "powerful" => ModelTier::Powerful,
            "private" => ModelTier::Private,
            _ => ModelTier::Other(value),
        }
    }
}

impl<'de> Deserialize<'de> for ModelTier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ModelTier::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub tier: ModelTier,
    pub cost: String,
    #[serde(default)]
    pub best_for: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StylesResponse {
    pub styles: Vec<SummaryStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub default_model: Option<String>,
    pub default_summary_style: Option<String>,
    pub summary_language: Option<String>,
}

/// Partial update for `PUT /settings/llm`; unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LlmPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_summary_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    #[default]
    Daily,
    Weekly,
}

impl DigestFrequency {
    pub fn next(self) -> Self {
        match self {
            DigestFrequency::Daily => DigestFrequency::Weekly,
            DigestFrequency::Weekly => DigestFrequency::Daily,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DigestFrequency::Daily => "Every day",
            DigestFrequency::Weekly => "Every week",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DigestSchedule {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub frequency: DigestFrequency,
    #[serde(default = "default_send_hour")]
    pub send_at_hour: u8,
    pub timezone: Option<String>,
    pub recipient_email: Option<String>,
}

fn default_send_hour() -> u8 {
    8
}

impl Default for DigestSchedule {
    fn default() -> Self {
        Self {
            is_enabled: false,
            frequency: DigestFrequency::Daily,
            send_at_hour: default_send_hour(),
            timezone: None,
            recipient_email: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<DigestFrequency>,
}

#[derive(Debug, Deserialize)]
pub struct AuthUrl {
    pub auth_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummarizeResult {
    pub summary: Option<String>,
    pub model_used: Option<String>,
    #[serde(default)]
    pub reply_suggestions: Vec<String>,
    pub tokens_used: Option<u64>,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn email(id: &str, urgency: Option<f64>) -> Email {
        Email {
            id: id.to_string(),
            thread_id: Some(format!("t-{id}")),
            subject: Some(format!("Subject {id}")),
            sender: Some("alice@example.com".to_string()),
            sender_name: Some("Alice".to_string()),
            snippet: Some("Quick question about the invoice".to_string()),
            has_attachments: false,
            labels: None,
            is_read: false,
            is_starred: false,
            urgency_score: urgency,
            importance_score: None,
            action_required: Some(false),
            ai_category: None,
            sentiment: None,
            received_at: None,
            summary: None,
            body_plain: None,
        }
    }

    pub fn summary(replies: &[&str]) -> Summary {
        Summary {
            text: "Alice needs the Q3 invoice by Friday.".to_string(),
            style: "bullet_points".to_string(),
            model_used: "claude-haiku".to_string(),
            reply_suggestions: replies.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn thread(id: &str, summary: Option<&str>) -> Thread {
        Thread {
            thread_id: id.to_string(),
            message_count: 3,
            latest_at: None,
            max_urgency: Some(4.0),
            subject: Some(format!("Thread {id}")),
            sender: Some("bob@example.com".to_string()),
            snippet: Some("Latest reply text".to_string()),
            summary: summary.map(str::to_string),
        }
    }

    pub fn user() -> CurrentUser {
        CurrentUser {
            id: "u1".to_string(),
            email: "me@example.com".to_string(),
            name: Some("me".to_string()),
            default_model: Some("claude-haiku".to_string()),
            default_summary_style: Some("bullet_points".to_string()),
            summary_language: Some("en".to_string()),
        }
    }

    pub fn models() -> Vec<Model> {
        vec![
            Model {
                id: "claude-haiku".to_string(),
                name: "Claude Haiku".to_string(),
                provider: "Anthropic".to_string(),
                tier: ModelTier::Fast,
                cost: "low".to_string(),
                best_for: vec![],
            },
            Model {
                id: "gpt-4o".to_string(),
                name: "GPT-4o".to_string(),
                provider: "OpenAI".to_string(),
                tier: ModelTier::Powerful,
                cost: "high".to_string(),
                best_for: vec![],
            },
        ]
    }

    pub fn styles() -> Vec<SummaryStyle> {
        vec![
            SummaryStyle {
                id: "bullet_points".to_string(),
                name: "Bullet points".to_string(),
                icon: "list".to_string(),
                description: "5-7 key points".to_string(),
            },
            SummaryStyle {
                id: "one_liner".to_string(),
                name: "One liner".to_string(),
                icon: "flash".to_string(),
                description: "Single sentence".to_string(),
            },
        ]
    }
}
