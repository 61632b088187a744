//! The confidence ladder of spec §4.E: given a set of `(value, source)`
//! candidates and a per-field tolerance, decide how much to trust the
//! agreement between them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Confidence {
    None,
    Bad,
    Good,
    Best,
}

/// Evaluates the ladder for a set of candidates, given a same-type
/// "matches" predicate (already baked with the field's tolerance). `source`
/// must distinguish producers (e.g. estimator kind or [`crate::TimeTruthSource`]
/// depending on which granularity the caller is comparing at).
///
/// Ladder, tried in order (spec §4.E):
/// 1. >=1 cross-source match and all cross-matching candidates mutually
///    agree -> `Best`.
/// 2. Only same-source matches, multiple sources present -> `Good`.
/// 3. Exactly one candidate -> `Best` (no ambiguity to resolve).
/// 4. Only same-source matches with competing sources that never
///    cross-agree, or no matches at all -> `Bad`.
/// 5. No candidates -> `None`.
pub fn confidence<T: Copy, S: Copy + PartialEq>(
    candidates: &[(T, S)],
    matches: impl Fn(T, T) -> bool,
) -> Confidence {
    if candidates.is_empty() {
        return Confidence::None;
    }
    if candidates.len() == 1 {
        return Confidence::Best;
    }

    let mut cross_match_members: Vec<usize> = Vec::new();
    let mut any_same_source_match = false;

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if !matches(candidates[i].0, candidates[j].0) {
                continue;
            }
            if candidates[i].1 == candidates[j].1 {
                any_same_source_match = true;
            } else {
                cross_match_members.push(i);
                cross_match_members.push(j);
            }
        }
    }

    if !cross_match_members.is_empty() {
        cross_match_members.sort_unstable();
        cross_match_members.dedup();
        let all_agree = cross_match_members.iter().all(|&i| {
            cross_match_members
                .iter()
                .all(|&j| i == j || matches(candidates[i].0, candidates[j].0))
        });
        if all_agree {
            return Confidence::Best;
        }
    }

    if any_same_source_match {
        let mut distinct_sources: Vec<S> = Vec::new();
        for (_, s) in candidates {
            if !distinct_sources.iter().any(|existing| existing == s) {
                distinct_sources.push(*s);
            }
        }
        if distinct_sources.len() > 1 {
            return Confidence::Good;
        }
    }

    Confidence::Bad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, PartialEq)]
    enum Src {
        A,
        B,
    }

    fn exact(a: i64, b: i64) -> bool {
        a == b
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(confidence::<i64, Src>(&[], exact), Confidence::None);
    }

    #[test]
    fn single_candidate_is_best() {
        assert_eq!(confidence(&[(1i64, Src::A)], exact), Confidence::Best);
    }

    #[test]
    fn cross_source_agreement_is_best() {
        let candidates = [(100i64, Src::A), (100, Src::B)];
        assert_eq!(confidence(&candidates, exact), Confidence::Best);
    }

    #[test]
    fn same_source_only_with_multiple_sources_is_good() {
        let candidates = [(100i64, Src::A), (100, Src::A), (999, Src::B)];
        assert_eq!(confidence(&candidates, exact), Confidence::Good);
    }

    #[test]
    fn competing_single_source_candidates_are_bad() {
        let candidates = [(100i64, Src::A), (999, Src::A)];
        assert_eq!(confidence(&candidates, exact), Confidence::Bad);
    }
}
