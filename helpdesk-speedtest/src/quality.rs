/// Below this download speed the "low speed" dialog is offered.
pub const LOW_SPEED_THRESHOLD: f64 = 15.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedQuality {
    Excellent,
    Good,
    Satisfactory,
    Low,
}

impl SpeedQuality {
    /// Four-level scale used by the counter widget.
    pub fn classify(speed: f64) -> Self {
        if speed >= 30.0 {
            Self::Excellent
        } else if speed >= 15.0 {
            Self::Good
        } else if speed >= 5.0 {
            Self::Satisfactory
        } else {
            Self::Low
        }
    }

    /// Three-level scale used by the gauge widget.
    pub fn classify_coarse(speed: f64) -> Self {
        if speed >= 30.0 {
            Self::Excellent
        } else if speed >= 15.0 {
            Self::Good
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Отличная",
            Self::Good => "Хорошая",
            Self::Satisfactory => "Удовлетворительная",
            Self::Low => "Низкая",
        }
    }

    /// Whether the result is shown as a success (rather than a warning).
    pub fn is_acceptable(self) -> bool {
        !matches!(self, Self::Low)
    }
}

pub fn is_low_speed(speed: f64) -> bool {
    speed < LOW_SPEED_THRESHOLD
}
