//! Static reaction tables: wire code -> kind -> (glyph, haptic pattern).
//!
//! The tables are plain data. Callers build a [`ReactionRegistry`] once and
//! hand it to whatever needs to map codes or look up patterns.

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReactionKind {
    RaiseHand,
    Confused,
    Interesting,
    /// A wire code the registry does not know.
    Invalid,
    /// Synthetic: the reaction fetch failed at the transport or status level.
    HttpError,
    /// Synthetic: the reaction fetch returned a payload that did not decode.
    DecodeError,
}

impl ReactionKind {
    pub fn label(self) -> &'static str {
        match self {
            ReactionKind::RaiseHand => "RAISE_HAND",
            ReactionKind::Confused => "CONFUSED",
            ReactionKind::Interesting => "INTERESTING",
            ReactionKind::Invalid => "INVALID",
            ReactionKind::HttpError => "HTTP_ERROR",
            ReactionKind::DecodeError => "DECODE_ERROR",
        }
    }
}

/// Pulse types a wrist device can play. Names follow the common watch haptic vocabulary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HapticPulse {
    Notification,
    DirectionUp,
    DirectionDown,
    Success,
    Failure,
    Retry,
    Start,
    Stop,
    Click,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PulseStep {
    /// Offset from the start of the pattern, not from the previous step.
    pub delay_ms: u64,
    pub pulse: HapticPulse,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HapticPattern {
    pub name: &'static str,
    pub steps: &'static [PulseStep],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReactionProfile {
    pub kind: ReactionKind,
    /// Wire code, `None` for kinds that never arrive from the server.
    pub code: Option<i64>,
    pub glyph: &'static str,
    pub pattern: Option<HapticPattern>,
}

pub const RAISE_HAND_PATTERN: HapticPattern = HapticPattern {
    name: "raise-hand",
    steps: &[
        PulseStep {
            delay_ms: 0,
            pulse: HapticPulse::Failure,
        },
        PulseStep {
            delay_ms: 1000,
            pulse: HapticPulse::Failure,
        },
    ],
};

pub const CONFUSED_PATTERN: HapticPattern = HapticPattern {
    name: "confused",
    steps: &[
        PulseStep {
            delay_ms: 0,
            pulse: HapticPulse::Stop,
        },
        PulseStep {
            delay_ms: 1000,
            pulse: HapticPulse::Stop,
        },
    ],
};

pub const INTERESTING_PATTERN: HapticPattern = HapticPattern {
    name: "interesting",
    steps: &[PulseStep {
        delay_ms: 0,
        pulse: HapticPulse::Success,
    }],
};

/// Shared by every synthetic kind: one retry tap, so failures are felt but not
/// mistaken for an attendee reaction.
pub const NOTICE_PATTERN: HapticPattern = HapticPattern {
    name: "notice",
    steps: &[PulseStep {
        delay_ms: 0,
        pulse: HapticPulse::Retry,
    }],
};

pub const STANDARD_PROFILES: &[ReactionProfile] = &[
    ReactionProfile {
        kind: ReactionKind::RaiseHand,
        code: Some(1),
        glyph: "✋",
        pattern: Some(RAISE_HAND_PATTERN),
    },
    ReactionProfile {
        kind: ReactionKind::Confused,
        code: Some(2),
        glyph: "😕",
        pattern: Some(CONFUSED_PATTERN),
    },
    ReactionProfile {
        kind: ReactionKind::Interesting,
        code: Some(3),
        glyph: "💡",
        pattern: Some(INTERESTING_PATTERN),
    },
    ReactionProfile {
        kind: ReactionKind::Invalid,
        code: None,
        glyph: "INVALID REACTION",
        pattern: Some(NOTICE_PATTERN),
    },
    ReactionProfile {
        kind: ReactionKind::HttpError,
        code: None,
        glyph: "HTTP ERROR",
        pattern: Some(NOTICE_PATTERN),
    },
    ReactionProfile {
        kind: ReactionKind::DecodeError,
        code: None,
        glyph: "JSON ERROR",
        pattern: Some(NOTICE_PATTERN),
    },
];

/// Immutable lookup over a set of [`ReactionProfile`]s.
#[derive(Clone, Debug)]
pub struct ReactionRegistry {
    profiles: Vec<ReactionProfile>,
}

impl Default for ReactionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReactionRegistry {
    pub fn standard() -> Self {
        Self::from_profiles(STANDARD_PROFILES.to_vec())
    }

    pub fn from_profiles(profiles: Vec<ReactionProfile>) -> Self {
        Self { profiles }
    }

    pub fn profile(&self, kind: ReactionKind) -> Option<&ReactionProfile> {
        self.profiles.iter().find(|p| p.kind == kind)
    }

    /// Unknown codes degrade to [`ReactionKind::Invalid`].
    pub fn kind_for_code(&self, code: i64) -> ReactionKind {
        self.profiles
            .iter()
            .find(|p| p.code == Some(code))
            .map(|p| p.kind)
            .unwrap_or(ReactionKind::Invalid)
    }

    pub fn glyph(&self, kind: ReactionKind) -> &str {
        self.profile(kind).map(|p| p.glyph).unwrap_or(kind.label())
    }

    pub fn pattern(&self, kind: ReactionKind) -> Option<HapticPattern> {
        self.profile(kind).and_then(|p| p.pattern)
    }
}

pub fn standard_registry() -> ReactionRegistry {
    ReactionRegistry::standard()
}
