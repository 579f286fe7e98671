//! Include/exclude filters applied to parsed manifest entries.

use globset::{Glob, GlobMatcher};
use regex::Regex;
use tracing::debug;

use crate::spec::{EnumPatternMode, ResGrabError, Result, SpecGrabOptions};

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypePatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecEntryPatterns {
    pub(crate) patterns_include: Option<TypePatternSeq>,
    pub(crate) patterns_exclude: Option<TypePatternSeq>,
}

impl SpecEntryPatterns {
    pub(crate) fn from_options(spec_grab_options: &SpecGrabOptions) -> Result<Self> {
        Ok(Self {
            patterns_include: _compile(
                spec_grab_options.patterns_include.as_deref(),
                spec_grab_options.rule_pattern,
            )?,
            patterns_exclude: _compile(
                spec_grab_options.patterns_exclude.as_deref(),
                spec_grab_options.rule_pattern,
            )?,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.patterns_include.is_none() && self.patterns_exclude.is_none()
    }

    /// Entry is kept when it matches an include (or none are given) and no exclude.
    pub(crate) fn should_keep(&self, entry: &str) -> bool {
        let b_included = self
            .patterns_include
            .as_ref()
            .is_none_or(|p| p.is_match(entry));
        let b_excluded = self
            .patterns_exclude
            .as_ref()
            .is_some_and(|p| p.is_match(entry));
        b_included && !b_excluded
    }

    pub(crate) fn apply(&self, entries: Vec<String>) -> Vec<String> {
        if self.is_empty() {
            return entries;
        }

        let n_before = entries.len();
        let l_kept: Vec<String> = entries
            .into_iter()
            .filter(|entry| self.should_keep(entry))
            .collect();
        debug!(
            kept = l_kept.len(),
            dropped = n_before - l_kept.len(),
            "Applied entry filters"
        );
        l_kept
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| ResGrabError::InvalidPattern(e.to_string()))?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex =
                    Regex::new(pattern).map_err(|e| ResGrabError::InvalidPattern(e.to_string()))?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

/// Apply the include/exclude options to `entries`, preserving order.
///
/// Returns the entries unchanged when no patterns are configured. Fails with
/// [`ResGrabError::InvalidPattern`] if a pattern does not compile.
pub fn filter_entries(
    entries: Vec<String>,
    spec_grab_options: &SpecGrabOptions,
) -> Result<Vec<String>> {
    Ok(SpecEntryPatterns::from_options(spec_grab_options)?.apply(entries))
}

#[cfg(test)]
mod tests {
    use super::filter_entries;
    use crate::spec::{EnumPatternMode, ResGrabError, SpecGrabOptions};

    fn entries() -> Vec<String> {
        ["models/player.mdl", "sound/ambience/wind.wav", "halflife.wad", "gfx/env/skyup.tga"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn filter_entries_without_patterns_is_identity() {
        let l_kept = filter_entries(entries(), &SpecGrabOptions::default()).expect("filter");
        assert_eq!(l_kept, entries());
    }

    #[test]
    fn filter_entries_glob_exclude() {
        let spec_options = SpecGrabOptions {
            patterns_exclude: Some(vec!["*.wad".to_string()]),
            ..SpecGrabOptions::default()
        };
        let l_kept = filter_entries(entries(), &spec_options).expect("filter");
        assert_eq!(
            l_kept,
            vec!["models/player.mdl", "sound/ambience/wind.wav", "gfx/env/skyup.tga"]
        );
    }

    #[test]
    fn filter_entries_regex_include_and_literal_exclude() {
        let spec_options = SpecGrabOptions {
            patterns_include: Some(vec![r"^(models|sound)/".to_string()]),
            rule_pattern: EnumPatternMode::Regex,
            ..SpecGrabOptions::default()
        };
        let l_kept = filter_entries(entries(), &spec_options).expect("filter");
        assert_eq!(l_kept, vec!["models/player.mdl", "sound/ambience/wind.wav"]);

        let spec_options = SpecGrabOptions {
            patterns_exclude: Some(vec!["ambience".to_string()]),
            rule_pattern: EnumPatternMode::Literal,
            ..SpecGrabOptions::default()
        };
        let l_kept = filter_entries(entries(), &spec_options).expect("filter");
        assert_eq!(l_kept.len(), 3);
        assert!(!l_kept.iter().any(|e| e.contains("ambience")));
    }

    #[test]
    fn filter_entries_rejects_invalid_patterns() {
        let spec_options = SpecGrabOptions {
            patterns_include: Some(vec!["[".to_string()]),
            rule_pattern: EnumPatternMode::Regex,
            ..SpecGrabOptions::default()
        };
        let err = filter_entries(entries(), &spec_options).unwrap_err();
        assert!(matches!(err, ResGrabError::InvalidPattern(_)));

        let spec_options = SpecGrabOptions {
            patterns_exclude: Some(vec!["a[".to_string()]),
            ..SpecGrabOptions::default()
        };
        let err = filter_entries(entries(), &spec_options).unwrap_err();
        assert!(matches!(err, ResGrabError::InvalidPattern(_)));
    }
}
