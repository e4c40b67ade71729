// Smart-light control. Validates user input (selectors, colours, brightness)
// before anything reaches the vendor API, so the HTTP client stays dumb.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LightColor {
    #[serde(default)]
    pub hue: f32,
    #[serde(default)]
    pub saturation: f32,
    #[serde(default)]
    pub kelvin: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Light {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub connected: bool,
    pub power: Power,
    #[serde(default)]
    pub brightness: f32,
    #[serde(default)]
    pub color: LightColor,
    pub group: Option<NamedRef>,
    pub location: Option<NamedRef>,
}

/// Target state; unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<Power>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    /// Transition time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    pub color: String,
    /// Seconds per cycle.
    pub period: f32,
    pub cycles: f32,
    pub power_on: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightResult {
    pub id: String,
    pub label: String,
    pub status: String,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LightError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Brightness must be between 0 and 100, got {0}")]
    InvalidBrightness(u8),

    #[error("The light token was rejected")]
    Unauthorized,

    #[error("No lights matched the selector")]
    NotFound,

    #[error("Light API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl LightError {
    pub fn user_message(&self) -> String {
        match self {
            LightError::InvalidSelector(_)
            | LightError::InvalidColor(_)
            | LightError::InvalidBrightness(_)
            | LightError::NotFound => format!("⚠️ {}", self),
            LightError::Unauthorized => "⚠️ The light service rejected our token.".to_string(),
            LightError::Api { .. } | LightError::Transport(_) => {
                "⚠️ Couldn't talk to the lights right now.".to_string()
            }
        }
    }
}

// ============================================================================
// CONTROLLER TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait LightController: Send + Sync {
    async fn list(&self, selector: &str) -> Result<Vec<Light>, LightError>;
    async fn set_state(
        &self,
        selector: &str,
        state: &LightState,
    ) -> Result<Vec<LightResult>, LightError>;
    async fn toggle(&self, selector: &str) -> Result<Vec<LightResult>, LightError>;
    async fn pulse(&self, selector: &str, wave: &Waveform) -> Result<Vec<LightResult>, LightError>;
    async fn breathe(&self, selector: &str, wave: &Waveform)
        -> Result<Vec<LightResult>, LightError>;
}

// ============================================================================
// VALIDATION
// ============================================================================

const NAMED_COLORS: &[&str] = &[
    "white", "red", "orange", "yellow", "cyan", "green", "blue", "purple", "pink",
];

const SELECTOR_PREFIXES: &[&str] = &[
    "id:",
    "label:",
    "group_id:",
    "group:",
    "location_id:",
    "location:",
    "scene_id:",
];

pub fn validate_selector(selector: &str) -> Result<String, LightError> {
    let selector = selector.trim();
    if selector.is_empty() || selector == "all" {
        return Ok("all".to_string());
    }

    // Comma separated selectors are allowed by the API
    for part in selector.split(',') {
        let valid = SELECTOR_PREFIXES
            .iter()
            .any(|p| part.starts_with(p) && part.len() > p.len());
        if !valid {
            return Err(LightError::InvalidSelector(part.to_string()));
        }
    }
    Ok(selector.to_string())
}

/// Accepts named colours, `#rrggbb`, `rgb:r,g,b`, `kelvin:N`, `hue:N`,
/// `saturation:N` and `brightness:N`, space separated.
pub fn validate_color(color: &str) -> Result<String, LightError> {
    let color = color.trim().to_lowercase();
    if color.is_empty() {
        return Err(LightError::InvalidColor(color));
    }

    for part in color.split_whitespace() {
        if !is_color_component(part) {
            return Err(LightError::InvalidColor(part.to_string()));
        }
    }
    Ok(color)
}

fn is_color_component(part: &str) -> bool {
    if NAMED_COLORS.contains(&part) {
        return true;
    }
    if let Some(hex) = part.strip_prefix('#') {
        return hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(rgb) = part.strip_prefix("rgb:") {
        let channels: Vec<&str> = rgb.split(',').collect();
        return channels.len() == 3 && channels.iter().all(|c| c.parse::<u8>().is_ok());
    }
    if let Some(k) = part.strip_prefix("kelvin:") {
        return k.parse::<u32>().is_ok_and(|k| (1500..=9000).contains(&k));
    }
    if let Some(h) = part.strip_prefix("hue:") {
        return h.parse::<f32>().is_ok_and(|h| (0.0..=360.0).contains(&h));
    }
    for prefix in ["saturation:", "brightness:"] {
        if let Some(v) = part.strip_prefix(prefix) {
            return v.parse::<f32>().is_ok_and(|v| (0.0..=1.0).contains(&v));
        }
    }
    false
}

/// Percent (0-100) to the API's 0.0-1.0 scale.
pub fn brightness_from_percent(percent: u8) -> Result<f32, LightError> {
    if percent > 100 {
        return Err(LightError::InvalidBrightness(percent));
    }
    Ok(percent as f32 / 100.0)
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct LightService<C: LightController> {
    controller: C,
}

impl<C: LightController> LightService<C> {
    pub fn new(controller: C) -> Self {
        Self { controller }
    }

    pub async fn list(&self, selector: &str) -> Result<Vec<Light>, LightError> {
        let selector = validate_selector(selector)?;
        self.controller.list(&selector).await
    }

    pub async fn power(
        &self,
        selector: &str,
        power: Power,
    ) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        let state = LightState {
            power: Some(power),
            duration: Some(0.5),
            ..Default::default()
        };
        self.controller.set_state(&selector, &state).await
    }

    pub async fn toggle(&self, selector: &str) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        self.controller.toggle(&selector).await
    }

    pub async fn color(&self, selector: &str, color: &str) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        let state = LightState {
            power: Some(Power::On),
            color: Some(validate_color(color)?),
            duration: Some(1.0),
            ..Default::default()
        };
        self.controller.set_state(&selector, &state).await
    }

    pub async fn brightness(
        &self,
        selector: &str,
        percent: u8,
    ) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        let state = LightState {
            power: Some(Power::On),
            brightness: Some(brightness_from_percent(percent)?),
            duration: Some(1.0),
            ..Default::default()
        };
        self.controller.set_state(&selector, &state).await
    }

    pub async fn pulse(
        &self,
        selector: &str,
        color: &str,
        cycles: u8,
    ) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        let wave = Waveform {
            color: validate_color(color)?,
            period: 1.0,
            cycles: cycles.clamp(1, 20) as f32,
            power_on: true,
        };
        self.controller.pulse(&selector, &wave).await
    }

    pub async fn breathe(
        &self,
        selector: &str,
        color: &str,
        cycles: u8,
    ) -> Result<Vec<LightResult>, LightError> {
        let selector = validate_selector(selector)?;
        let wave = Waveform {
            color: validate_color(color)?,
            period: 2.0,
            cycles: cycles.clamp(1, 20) as f32,
            power_on: true,
        };
        self.controller.breathe(&selector, &wave).await
    }

    /// Attention flash: three quick red pulses.
    pub async fn alert(&self, selector: &str) -> Result<Vec<LightResult>, LightError> {
        self.pulse(selector, "red", 3).await
    }
}
