use super::warning::{self, WarningSchedule};
use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Closing and warning scripts spoken by the AI interviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scripts {
    /// Normal end of interview.
    pub standard_closing: String,
    /// Wall-clock budget exhausted.
    pub time_expired_closing: String,
    /// Question budget exhausted before the time budget.
    pub early_completion_closing: String,
    /// Nudge at the first time warning.
    pub first_warning: String,
    /// Nudge at the final time warning.
    pub final_warning: String,
}

impl Default for Scripts {
    fn default() -> Self {
        Self {
            standard_closing: "Thank you for your time today. That concludes our interview."
                .to_string(),
            time_expired_closing:
                "We have reached the end of our scheduled time. Thank you for speaking with us."
                    .to_string(),
            early_completion_closing:
                "That covers everything I wanted to ask. Is there anything you would like to add?"
                    .to_string(),
            first_warning: "We are over halfway through our time, so let's keep a good pace."
                .to_string(),
            final_warning: "We have just a few minutes left, so please begin wrapping up."
                .to_string(),
        }
    }
}

/// Generative model parameters, resolved once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub voice: String,
    pub system_prompt: String,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-live".to_string(),
            voice: "Aoede".to_string(),
            system_prompt: String::new(),
        }
    }
}

/// Service-level defaults from which each interview's config is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewDefaults {
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    pub default_duration_secs: u64,
    pub first_warning_percent: u8,
    pub final_warning_percent: u8,
    pub total_questions: u32,
    pub tick_interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub closing_grace_secs: u64,
    pub early_completion_grace_secs: u64,
    pub scripts: Scripts,
    pub model: ModelParams,
}

impl Default for InterviewDefaults {
    fn default() -> Self {
        Self {
            min_duration_secs: 300,  // 5 minutes
            max_duration_secs: 1800, // 30 minutes
            default_duration_secs: 900,
            first_warning_percent: 66,
            final_warning_percent: 83,
            total_questions: 8,
            tick_interval_secs: 5,
            connect_timeout_secs: 10,
            closing_grace_secs: 4,
            early_completion_grace_secs: 30,
            scripts: Scripts::default(),
            model: ModelParams::default(),
        }
    }
}

/// Immutable per-interview configuration, resolved once at session
/// creation. A later change to the service defaults cannot touch an
/// in-flight interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub session_id: String,
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    /// Effective duration, already clamped into [min, max].
    pub scheduled_duration_secs: u64,
    pub first_warning_percent: u8,
    pub final_warning_percent: u8,
    pub total_questions: u32,
    pub tick_interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub closing_grace_secs: u64,
    pub early_completion_grace_secs: u64,
    pub scripts: Scripts,
    pub model: ModelParams,
}

impl InterviewConfig {
    /// Resolve a session config from service defaults and the creation
    /// request. An out-of-range requested duration is clamped, not
    /// rejected; invalid warning percents or degenerate durations are
    /// rejected here so they never surface mid-interview.
    pub fn resolve(
        session_id: impl Into<String>,
        defaults: &InterviewDefaults,
        job_title: &str,
        job_description: &str,
        requested_duration_secs: Option<u64>,
    ) -> Result<Self, SessionError> {
        let requested = requested_duration_secs.unwrap_or(defaults.default_duration_secs);
        let scheduled = requested.clamp(defaults.min_duration_secs, defaults.max_duration_secs);

        let mut model = defaults.model.clone();
        if model.system_prompt.is_empty() {
            model.system_prompt = format!(
                "You are a professional interviewer conducting a voice interview \
                 for the role of {job_title}. Job description: {job_description}. \
                 Ask one question at a time and keep your responses concise."
            );
        }

        let config = Self {
            session_id: session_id.into(),
            min_duration_secs: defaults.min_duration_secs,
            max_duration_secs: defaults.max_duration_secs,
            scheduled_duration_secs: scheduled,
            first_warning_percent: defaults.first_warning_percent,
            final_warning_percent: defaults.final_warning_percent,
            total_questions: defaults.total_questions,
            tick_interval_secs: defaults.tick_interval_secs,
            connect_timeout_secs: defaults.connect_timeout_secs,
            closing_grace_secs: defaults.closing_grace_secs,
            early_completion_grace_secs: defaults.early_completion_grace_secs,
            scripts: defaults.scripts.clone(),
            model,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.min_duration_secs == 0 || self.min_duration_secs > self.max_duration_secs {
            return Err(SessionError::InvalidConfig(format!(
                "duration bounds [{}, {}] are degenerate",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        let first = self.first_warning_percent;
        let last = self.final_warning_percent;
        if first == 0 || last >= 100 || first >= last {
            return Err(SessionError::InvalidConfig(format!(
                "warning percents must satisfy 0 < first < final < 100, got {first} and {last}"
            )));
        }
        if self.total_questions == 0 {
            return Err(SessionError::InvalidConfig(
                "total_questions must be positive".to_string(),
            ));
        }
        // Guarantees at least one warning opportunity for the shortest
        // allowed interview.
        if self.tick_interval_secs == 0 || self.tick_interval_secs > self.min_duration_secs / 2 {
            return Err(SessionError::InvalidConfig(format!(
                "tick interval {}s must be in (0, {}s]",
                self.tick_interval_secs,
                self.min_duration_secs / 2
            )));
        }
        if self.connect_timeout_secs == 0 || self.closing_grace_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "connect timeout and closing grace must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn warning_schedule(&self) -> WarningSchedule {
        warning::schedule(
            self.scheduled_duration_secs,
            self.first_warning_percent,
            self.final_warning_percent,
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn closing_grace(&self) -> Duration {
        Duration::from_secs(self.closing_grace_secs)
    }

    pub fn early_completion_grace(&self) -> Duration {
        Duration::from_secs(self.early_completion_grace_secs)
    }
}
