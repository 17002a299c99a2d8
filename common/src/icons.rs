//! Icon references produced by the content model.
//!
//! The model names icons freely (Lucide-style names such as `"TrendingUp"`);
//! only a fixed set is renderable. Every name resolves to some [`Icon`], with
//! [`Icon::HelpCircle`] standing in for anything unrecognized.

use serde::{Deserialize, Serialize};

macro_rules! icons {
    ($($variant:ident => $name:literal, $glyph:literal;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Icon {
            $($variant,)+
        }

        impl Icon {
            pub const ALL: &'static [Icon] = &[$(Icon::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Icon::$variant => $name,)+
                }
            }

            /// Single-cell glyph used by terminal surfaces.
            pub fn glyph(self) -> char {
                match self {
                    $(Icon::$variant => $glyph,)+
                }
            }

            /// Exact-name lookup; `None` when the name is not in the set.
            pub fn from_name(name: &str) -> Option<Icon> {
                match name {
                    $($name => Some(Icon::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

icons! {
    Activity => "Activity", '~';
    AlertCircle => "AlertCircle", '!';
    ArrowRight => "ArrowRight", '→';
    Award => "Award", '★';
    BarChart => "BarChart", '▇';
    Book => "Book", '▤';
    Briefcase => "Briefcase", '▣';
    Calendar => "Calendar", '▦';
    CheckCircle => "CheckCircle", '✓';
    Clock => "Clock", '◷';
    Cloud => "Cloud", '☁';
    Code => "Code", '⌘';
    Compass => "Compass", '✧';
    Cpu => "Cpu", '▩';
    Database => "Database", '◫';
    DollarSign => "DollarSign", '$';
    FileText => "FileText", '▭';
    Flag => "Flag", '⚑';
    Globe => "Globe", '◍';
    GraduationCap => "GraduationCap", '◭';
    Heart => "Heart", '♥';
    HelpCircle => "HelpCircle", '?';
    Home => "Home", '⌂';
    Layers => "Layers", '≡';
    Leaf => "Leaf", '❦';
    Lightbulb => "Lightbulb", '✦';
    Lock => "Lock", '⊠';
    Mail => "Mail", '✉';
    MessageCircle => "MessageCircle", '◌';
    PieChart => "PieChart", '◔';
    Rocket => "Rocket", '⇑';
    Search => "Search", '⌕';
    Settings => "Settings", '⚙';
    Shield => "Shield", '⛨';
    Sparkles => "Sparkles", '✶';
    Star => "Star", '☆';
    Sun => "Sun", '☀';
    Target => "Target", '◎';
    TrendingUp => "TrendingUp", '↗';
    Users => "Users", '☺';
    Zap => "Zap", 'ϟ';
}

impl Icon {
    /// Total lookup: unknown names map to [`Icon::HelpCircle`].
    ///
    /// Besides exact names this accepts kebab/snake case and any letter case,
    /// so `"trending-up"` and `"TRENDING_UP"` both give [`Icon::TrendingUp`].
    pub fn lookup(name: &str) -> Icon {
        if let Some(icon) = Icon::from_name(name) {
            return icon;
        }
        let folded = fold(name);
        Icon::ALL
            .iter()
            .copied()
            .find(|icon| fold(icon.name()) == folded)
            .unwrap_or(Icon::HelpCircle)
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Icon name as emitted by the model. Keeps the raw name for round-tripping
/// and resolves it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRef(pub String);

impl IconRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn icon(&self) -> Icon {
        Icon::lookup(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Icon> for IconRef {
    fn from(icon: Icon) -> Self {
        Self(icon.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_icon_round_trips_by_name() {
        for icon in Icon::ALL {
            assert_eq!(Icon::from_name(icon.name()), Some(*icon));
            assert_eq!(Icon::lookup(icon.name()), *icon);
        }
    }

    #[test]
    fn lookup_is_total() {
        assert_eq!(Icon::lookup(""), Icon::HelpCircle);
        assert_eq!(Icon::lookup("Unicorn"), Icon::HelpCircle);
        assert_eq!(IconRef::new("🚀").icon(), Icon::HelpCircle);
    }

    #[test]
    fn lookup_folds_case_and_separators() {
        assert_eq!(Icon::lookup("trending-up"), Icon::TrendingUp);
        assert_eq!(Icon::lookup("BAR_CHART"), Icon::BarChart);
        assert_eq!(Icon::lookup("lightbulb"), Icon::Lightbulb);
    }

    #[test]
    fn icon_ref_serializes_as_plain_string() {
        let json = serde_json::to_string(&IconRef::from(Icon::Rocket)).unwrap();
        assert_eq!(json, r#""Rocket""#);
        let back: IconRef = serde_json::from_str(r#""Zap""#).unwrap();
        assert_eq!(back.icon(), Icon::Zap);
    }
}
