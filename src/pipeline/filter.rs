//! Inclusion policy for merged streams
//!
//! A stream is accepted when all of the following hold, checked in order:
//!
//! 1. its `channel` is non-empty
//! 2. its `channel` ends with none of the banned endings
//! 3. it carries a channel group
//! 4. at least one of: a language is allowed, a broadcast area is allowed,
//!    or its `channel` ends with a forced ending
//!
//! Unset inclusion criteria never match, so a policy with no allowed
//! languages, no allowed areas and no forced endings rejects everything.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::FilterConfig;
use crate::models::Stream;
use crate::utils::format_elapsed;

/// First check a rejected stream failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    EmptyChannel,
    BannedEnding,
    MissingChannelGroup,
    NoInclusionMatch,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyChannel => "empty_channel",
            Self::BannedEnding => "banned_ending",
            Self::MissingChannelGroup => "missing_channel_group",
            Self::NoInclusionMatch => "no_inclusion_match",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

impl FilterStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    allowed_languages: Option<HashSet<String>>,
    allowed_broadcast_areas: Option<HashSet<String>>,
    banned_endings: Vec<String>,
    forced_endings: Option<Vec<String>>,
}

impl FilterPolicy {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            allowed_languages: config
                .allowed_languages
                .as_ref()
                .map(|v| v.iter().cloned().collect()),
            allowed_broadcast_areas: config
                .allowed_broadcast_areas
                .as_ref()
                .map(|v| v.iter().cloned().collect()),
            banned_endings: config.banned_endings.clone().unwrap_or_default(),
            forced_endings: config.forced_endings.clone(),
        }
    }

    /// True when no stream can ever satisfy the inclusion check
    pub fn rejects_everything(&self) -> bool {
        self.allowed_languages.is_none()
            && self.allowed_broadcast_areas.is_none()
            && self.forced_endings.is_none()
    }

    /// Why `stream` is rejected, or `None` if it is accepted
    pub fn evaluate(&self, stream: &Stream) -> Option<Rejection> {
        if stream.channel.is_empty() {
            return Some(Rejection::EmptyChannel);
        }
        if stream.channel_ends_with_any(&self.banned_endings) {
            return Some(Rejection::BannedEnding);
        }
        let Some(group) = stream.channel_group.as_ref() else {
            return Some(Rejection::MissingChannelGroup);
        };

        let language_match = self
            .allowed_languages
            .as_ref()
            .is_some_and(|allowed| group.speaks_any(allowed));
        let area_match = || {
            self.allowed_broadcast_areas
                .as_ref()
                .is_some_and(|allowed| group.broadcasts_in_any(allowed))
        };
        let forced_match = || {
            self.forced_endings
                .as_ref()
                .is_some_and(|forced| stream.channel_ends_with_any(forced))
        };

        if language_match || area_match() || forced_match() {
            None
        } else {
            Some(Rejection::NoInclusionMatch)
        }
    }

    pub fn accepts(&self, stream: &Stream) -> bool {
        self.evaluate(stream).is_none()
    }

    /// Accepted subset in input order; the input is left untouched
    pub fn apply(&self, streams: &[Stream]) -> (Vec<Stream>, FilterStats) {
        let start = Instant::now();
        if self.rejects_everything() {
            warn!(
                "No allowed languages, allowed broadcast areas or forced endings configured, every stream will be rejected"
            );
        }

        let mut stats = FilterStats {
            input: streams.len(),
            ..Default::default()
        };
        let mut accepted = Vec::new();
        for stream in streams {
            match self.evaluate(stream) {
                None => accepted.push(stream.clone()),
                Some(reason) => *stats.rejected.entry(reason).or_insert(0) += 1,
            }
        }
        stats.accepted = accepted.len();

        info!(
            "Filtering done in {} input={} accepted={} rejected={}",
            format_elapsed(start.elapsed()),
            stats.input,
            stats.accepted,
            stats.rejected_total()
        );
        for (reason, count) in &stats.rejected {
            debug!("  rejected reason={} count={}", reason.as_str(), count);
        }

        (accepted, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::stream;
    use rstest::rstest;
    use tracing_test::traced_test;

    fn list(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    fn policy(
        languages: Option<Vec<String>>,
        areas: Option<Vec<String>>,
        banned: Option<Vec<String>>,
        forced: Option<Vec<String>>,
    ) -> FilterPolicy {
        FilterPolicy::from_config(&FilterConfig {
            allowed_languages: languages,
            allowed_broadcast_areas: areas,
            banned_endings: banned,
            forced_endings: forced,
        })
    }

    #[test]
    fn test_banned_ending_beats_allowed_language() {
        let policy = policy(list(&["eng"]), None, list(&["banned"]), None);
        let s = stream("BBC.banned", &["eng"], &[]);
        assert_eq!(policy.evaluate(&s), Some(Rejection::BannedEnding));
    }

    #[test]
    fn test_forced_ending_bypasses_language_and_area() {
        let policy = policy(list(&["eng"]), list(&["c/UK"]), None, list(&["forced"]));
        let s = stream("XYZ.forced", &["pol"], &["c/PL"]);
        assert!(policy.accepts(&s));
    }

    #[test]
    fn test_unset_banned_endings_ban_nothing() {
        let policy = policy(list(&["eng"]), None, None, None);
        assert!(policy.accepts(&stream("BBC.banned", &["eng"], &[])));
    }

    #[rstest]
    #[case::language(list(&["eng"]), None, None, &["eng"], &[], "A.uk", true)]
    #[case::area(None, list(&["c/UK"]), None, &["pol"], &["c/UK"], "A.uk", true)]
    #[case::forced(None, None, list(&[".uk"]), &["pol"], &["c/PL"], "A.uk", true)]
    #[case::no_match(list(&["eng"]), list(&["c/UK"]), list(&[".uk"]), &["pol"], &["c/PL"], "A.pl", false)]
    #[case::empty_allowed_list_matches_nothing(list(&[]), None, None, &["eng"], &[], "A.uk", false)]
    fn test_inclusion_criteria(
        #[case] languages: Option<Vec<String>>,
        #[case] areas: Option<Vec<String>>,
        #[case] forced: Option<Vec<String>>,
        #[case] stream_languages: &[&str],
        #[case] stream_areas: &[&str],
        #[case] channel: &str,
        #[case] expected: bool,
    ) {
        let policy = policy(languages, areas, None, forced);
        let s = stream(channel, stream_languages, stream_areas);
        assert_eq!(policy.accepts(&s), expected);
    }

    #[test]
    #[traced_test]
    fn test_all_criteria_unset_rejects_everything() {
        let policy = policy(None, None, None, None);
        assert!(policy.rejects_everything());

        let streams = vec![
            stream("A.uk", &["eng"], &["c/UK"]),
            stream("B.forced", &[], &[]),
        ];
        let (accepted, stats) = policy.apply(&streams);
        assert!(accepted.is_empty());
        assert_eq!(stats.rejected.get(&Rejection::NoInclusionMatch), Some(&2));
        assert!(logs_contain("every stream will be rejected"));
    }

    #[test]
    fn test_empty_channel_rejected_first() {
        let policy = policy(list(&["eng"]), None, None, None);
        let mut s = stream("A.uk", &["eng"], &[]);
        s.channel.clear();
        assert_eq!(policy.evaluate(&s), Some(Rejection::EmptyChannel));
    }

    #[test]
    fn test_missing_channel_group_rejected() {
        let policy = policy(list(&["eng"]), None, list(&[".xx"]), None);
        let mut s = stream("A.uk", &["eng"], &[]);
        s.channel_group = None;
        assert_eq!(policy.evaluate(&s), Some(Rejection::MissingChannelGroup));
    }

    #[test]
    fn test_apply_scans_every_element_and_keeps_order() {
        let policy = policy(list(&["eng"]), None, None, None);
        // Adjacent accepted items are where remove-while-iterating skips elements
        let streams = vec![
            stream("A", &["eng"], &[]),
            stream("B", &["eng"], &[]),
            stream("C", &["fra"], &[]),
            stream("D", &["eng"], &[]),
            stream("E", &["eng"], &[]),
        ];
        let snapshot = streams.clone();

        let (accepted, stats) = policy.apply(&streams);
        let channels: Vec<&str> = accepted.iter().map(|s| s.channel.as_str()).collect();
        assert_eq!(channels, vec!["A", "B", "D", "E"]);
        assert_eq!(stats.input, 5);
        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.rejected_total(), 1);
        assert_eq!(streams, snapshot);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let policy = policy(list(&["eng"]), list(&["c/US"]), list(&[".pl"]), list(&[".forced"]));
        let streams = vec![
            stream("A.uk", &["eng"], &[]),
            stream("B.pl", &["eng"], &[]),
            stream("C.us", &["spa"], &["c/US"]),
            stream("D.forced", &[], &[]),
            stream("E.fr", &["fra"], &["c/FR"]),
        ];

        let (once, _) = policy.apply(&streams);
        let (twice, _) = policy.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }
}
