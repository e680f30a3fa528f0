use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReasonKind {
    CounterStrong,
    CounterWeak,
    Meta,
    Personal,
    GoodMatchup,
    BadMatchup,
}

/// Explanation groups, in the order they are always presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReasonCategory {
    Counter,
    Meta,
    Personal,
    Matchup,
}

impl ReasonKind {
    pub fn category(&self) -> ReasonCategory {
        match self {
            ReasonKind::CounterStrong | ReasonKind::CounterWeak => ReasonCategory::Counter,
            ReasonKind::Meta => ReasonCategory::Meta,
            ReasonKind::Personal => ReasonCategory::Personal,
            ReasonKind::GoodMatchup | ReasonKind::BadMatchup => ReasonCategory::Matchup,
        }
    }
}

/// One scoring term: what kind it is, how much it moved the score, and the
/// text shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reason {
    pub kind: ReasonKind,
    pub delta: f64,
    pub text: String,
}

impl Reason {
    pub fn new(kind: ReasonKind, delta: f64, text: impl Into<String>) -> Self {
        Reason {
            kind,
            delta,
            text: text.into(),
        }
    }
}

/// "+1.25" / "-1.80"
pub fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

const NEUTRAL: &str = "No strong signals detected (neutral pick).";

/// Join the strongest reasons into one line. Categories keep their fixed
/// order; within each, up to `max_per_category` reasons by |delta|.
/// Zero-delta reasons are left out.
pub fn render_explanation(reasons: &[Reason], max_per_category: usize) -> String {
    let categories = [
        ReasonCategory::Counter,
        ReasonCategory::Meta,
        ReasonCategory::Personal,
        ReasonCategory::Matchup,
    ];

    let mut parts = Vec::new();
    for category in categories {
        let mut in_category: Vec<&Reason> = reasons
            .iter()
            .filter(|r| r.kind.category() == category && r.delta != 0.0)
            .collect();
        // stable sort keeps computation order among equal magnitudes
        in_category.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
        parts.extend(
            in_category
                .into_iter()
                .take(max_per_category)
                .map(|r| r.text.as_str()),
        );
    }

    if parts.is_empty() {
        NEUTRAL.to_string()
    } else {
        parts.join("; ")
    }
}
