use crate::agents::Agent;
use crate::error::CallError;
use crate::settings::Settings;

use rand::seq::IndexedRandom;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumString};
use tokio_util::sync::CancellationToken;

pub const MOCK_CALL_ID: &str = "mock-call-id";
pub const MOCK_CALL_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Failed,
    Busy,
    NoAnswer,
    #[strum(to_string = "canceled", serialize = "cancelled")]
    Canceled,
    #[strum(default)]
    Other(String),
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Completed
                | CallStatus::Failed
                | CallStatus::Busy
                | CallStatus::NoAnswer
                | CallStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHandle {
    pub call_id: String,
    pub message: String,
    pub simulated: bool,
}

#[derive(Debug, Serialize)]
struct StartCallBody<'a> {
    phone_number: String,
    from: &'a str,
    model: &'static str,
    pathway_id: &'a str,
    organization_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    request_data: RequestData<'a>,
}

#[derive(Debug, Serialize)]
struct RequestData<'a> {
    agent_name: &'a str,
    persona_script: String,
}

#[derive(Debug, Deserialize)]
struct StartCallResponse {
    call_id: String,
}

#[derive(Debug, Deserialize)]
struct CallStatusResponse {
    status: String,
}

/// Digits-only phone number and country code, joined as `+<cc><number>`.
pub fn format_phone_number(phone: &str, country_code: &str) -> Result<String, CallError> {
    let number: String = phone.chars().filter(char::is_ascii_digit).collect();
    let code: String = country_code.chars().filter(char::is_ascii_digit).collect();

    if !(1..=4).contains(&code.len()) || !(6..=15).contains(&number.len()) {
        return Err(CallError::InvalidPhoneNumber);
    }
    Ok(format!("+{code}{number}"))
}

// Picks one line from each persona list for the call script.
pub fn persona_script(agent: &Agent) -> String {
    let mut rng = rand::rng();
    let mut pick = |items: &[String]| items.choose(&mut rng).cloned().unwrap_or_default();

    let catchphrase = pick(&agent.personality.catchphrases);
    let belief = pick(&agent.background.beliefs);
    let goal = pick(&agent.background.goals);
    let speech = pick(&agent.personality.speech_patterns);
    let fear = pick(&agent.background.fears);

    format!(
        "*encrypted channel open* The {title} is speaking.\n\n{catchphrase}\n\n*static*\n\n\
         {belief}\n\nPRIORITY: {goal}\n\n*signal degrading*\n\n{speech}\n\nWARNING: {fear}\n\n\
         *transmission ends*",
        title = agent.title,
    )
}

/// Client for the voice-call service.
pub struct VoiceClient {
    http: Client,
    base_url: String,
    api_key: String,
    org_id: String,
    from_number: String,
    disabled: bool,
    mock_delay: Duration,
}

impl VoiceClient {
    pub fn new(settings: &Settings) -> Result<Self, CallError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        if settings.voice_disabled {
            log::info!("Voice calls disabled, calls will be simulated");
        } else if !settings.voice_configured() {
            log::warn!("Voice credentials missing, calls will fail until configured");
        }

        Ok(Self {
            http,
            base_url: settings.bland_base_url.trim_end_matches('/').to_string(),
            api_key: settings.bland_api_key.trim().to_string(),
            org_id: settings.bland_org_id.trim().to_string(),
            from_number: settings.bland_from_number.clone(),
            disabled: settings.voice_disabled,
            mock_delay: MOCK_CALL_DELAY,
        })
    }

    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub async fn start_call(
        &self,
        agent: &Agent,
        phone: &str,
        country_code: &str,
        cancel: CancellationToken,
    ) -> Result<CallHandle, CallError> {
        let phone_number = format_phone_number(phone, country_code)?;

        if self.disabled {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CallError::Cancelled),
                _ = tokio::time::sleep(self.mock_delay) => {}
            }
            return Ok(CallHandle {
                call_id: MOCK_CALL_ID.to_string(),
                message: "Voice module disabled. Call simulation successful.".to_string(),
                simulated: true,
            });
        }

        if self.api_key.is_empty() || self.org_id.is_empty() {
            return Err(CallError::NotConfigured);
        }
        let pathway_id = agent
            .pathway_id()
            .ok_or_else(|| CallError::MissingPathway(agent.name.clone()))?;

        let body = StartCallBody {
            phone_number,
            from: &self.from_number,
            model: "enhanced",
            pathway_id,
            organization_id: &self.org_id,
            voice: agent.voice(),
            request_data: RequestData {
                agent_name: &agent.name,
                persona_script: persona_script(agent),
            },
        };

        let request = self
            .http
            .post(format!("{}/calls", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(CallError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::error!(
                "Voice call for {} via pathway {} failed with {}: {}",
                agent.name,
                pathway_id,
                status,
                detail
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED => CallError::Unauthorized,
                StatusCode::NOT_FOUND => CallError::PathwayNotFound,
                other => CallError::Upstream {
                    status: other.as_u16(),
                },
            });
        }

        let data: StartCallResponse = response.json().await?;
        log::info!("Voice call {} started for {}", data.call_id, agent.name);
        Ok(CallHandle {
            call_id: data.call_id,
            message: "Quantum transmission initiated successfully".to_string(),
            simulated: false,
        })
    }

    pub async fn get_call_status(&self, call_id: &str) -> Result<CallStatus, CallError> {
        if self.disabled {
            return Ok(CallStatus::Completed);
        }
        if self.api_key.is_empty() || self.org_id.is_empty() {
            return Err(CallError::NotConfigured);
        }

        let response = self
            .http
            .get(format!("{}/calls/{}", self.base_url, call_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Status lookup for call {call_id} failed with {status}");
            return Err(match status {
                StatusCode::UNAUTHORIZED => CallError::Unauthorized,
                other => CallError::Upstream {
                    status: other.as_u16(),
                },
            });
        }

        let data: CallStatusResponse = response.json().await?;
        Ok(CallStatus::from_str(data.status.trim())
            .unwrap_or_else(|_| CallStatus::Other(data.status.clone())))
    }

    /// Polls until the call reaches a terminal status, `max_wait` runs out or `cancel` fires.
    pub async fn poll_call(
        &self,
        call_id: &str,
        interval: Duration,
        max_wait: Duration,
        cancel: CancellationToken,
    ) -> Result<CallStatus, CallError> {
        let started = Instant::now();
        loop {
            let status = tokio::select! {
                _ = cancel.cancelled() => return Err(CallError::Cancelled),
                status = self.get_call_status(call_id) => status?,
            };
            if status.is_terminal() {
                return Ok(status);
            }
            if started.elapsed() + interval > max_wait {
                log::warn!("Gave up polling call {call_id}, last status {status}");
                return Err(CallError::Timeout);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(CallError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
