use serde::Serialize;

/// Qualitative wind level attached to an outlier year.
///
/// | Summit average (mph) | Label         |
/// |----------------------|---------------|
/// | > 10                 | high wind     |
/// | < 3                  | calm          |
/// | otherwise            | moderate wind |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WindLabel {
    #[serde(rename = "high wind")]
    HighWind,
    #[serde(rename = "moderate wind")]
    ModerateWind,
    #[serde(rename = "calm")]
    Calm,
}

impl WindLabel {
    pub fn from_speed(speed: f64) -> Self {
        match speed {
            s if s > 10.0 => WindLabel::HighWind,
            s if s < 3.0 => WindLabel::Calm,
            _ => WindLabel::ModerateWind,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindLabel::HighWind => "high wind",
            WindLabel::ModerateWind => "moderate wind",
            WindLabel::Calm => "calm",
        }
    }
}

impl std::fmt::Display for WindLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
