// src/gesture.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gesture labels produced by the classifier. Serialized as the single
/// character codes used by the landmark recorder and the model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gesture {
    #[serde(rename = "0")]
    Fist,
    #[serde(rename = "1")]
    Palm,
    #[serde(rename = "2")]
    Pinch,
    #[serde(rename = "3")]
    Point,
    #[serde(rename = "4")]
    ThumbLeft,
    #[serde(rename = "5")]
    NoHand,
    #[serde(rename = "6")]
    ThumbRight,
}

impl Gesture {
    pub const ALL: [Gesture; 7] = [
        Gesture::Fist,
        Gesture::Palm,
        Gesture::Pinch,
        Gesture::Point,
        Gesture::ThumbLeft,
        Gesture::NoHand,
        Gesture::ThumbRight,
    ];

    pub fn code(&self) -> char {
        match self {
            Self::Fist => '0',
            Self::Palm => '1',
            Self::Pinch => '2',
            Self::Point => '3',
            Self::ThumbLeft => '4',
            Self::NoHand => '5',
            Self::ThumbRight => '6',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fist => "FIST",
            Self::Palm => "PALM",
            Self::Pinch => "PINCH",
            Self::Point => "POINT",
            Self::ThumbLeft => "THUMB_LEFT",
            Self::NoHand => "NO_HAND",
            Self::ThumbRight => "THUMB_RIGHT",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gesture label '{0}'")]
pub struct UnknownGesture(pub String);

impl FromStr for Gesture {
    type Err = UnknownGesture;

    /// Accepts either the recorder code ("2") or the name ("PINCH", "pinch").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(gesture) = Self::from_code(c) {
                return Ok(gesture);
            }
        }
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownGesture(trimmed.to_string()))
    }
}

/// Discrete player actions handed to the command sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    TogglePlayPause,
    SeekForward,
    VolumeUp,
    VolumeDown,
    Rewind,
    FastForward,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TogglePlayPause => "PLAY/PAUSE",
            Self::SeekForward => "SEEK",
            Self::VolumeUp => "VOL UP",
            Self::VolumeDown => "VOL DOWN",
            Self::Rewind => "REWIND",
            Self::FastForward => "FORWARD",
        }
    }

    /// Key an input injector presses for this command.
    pub fn key_chord(&self) -> &'static str {
        match self {
            Self::TogglePlayPause => "space",
            Self::SeekForward | Self::FastForward => "right",
            Self::Rewind => "left",
            Self::VolumeUp => "volumeup",
            Self::VolumeDown => "volumedown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_recorder_keys() {
        assert_eq!(Gesture::from_code('5'), Some(Gesture::NoHand));
        assert_eq!(Gesture::from_code('6'), Some(Gesture::ThumbRight));
        assert_eq!(Gesture::from_code('7'), None);
        for gesture in Gesture::ALL {
            assert_eq!(Gesture::from_code(gesture.code()), Some(gesture));
        }
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("2".parse::<Gesture>().unwrap(), Gesture::Pinch);
        assert_eq!("palm".parse::<Gesture>().unwrap(), Gesture::Palm);
        assert_eq!(" THUMB_LEFT ".parse::<Gesture>().unwrap(), Gesture::ThumbLeft);
        assert!("wave".parse::<Gesture>().is_err());
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Gesture::Point).unwrap(), "\"3\"");
        let g: Gesture = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(g, Gesture::Palm);
        assert_eq!(
            serde_json::to_string(&Command::TogglePlayPause).unwrap(),
            "\"toggle-play-pause\""
        );
    }
}
