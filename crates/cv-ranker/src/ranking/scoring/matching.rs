/// Lower-case and strip dots and spaces so "Node.js" and "nodejs" compare equal.
pub(crate) fn normalize_skill(skill: &str) -> String {
    skill
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect()
}

const SKILL_VARIATIONS: &[&[&str]] = &[
    &["javascript", "js", "ecmascript"],
    &["java"],
    &["typescript", "ts"],
    &["python", "py", "python3"],
    &["springboot", "spring"],
    &["nodejs", "node"],
    &["reactjs", "react"],
    &["vuejs", "vue"],
    &["angularjs", "angular"],
    &["postgresql", "postgres"],
    &["kubernetes", "k8s"],
    &["golang", "go"],
    &["c#", "csharp"],
    &["c++", "cpp"],
];

fn same_variation(left: &str, right: &str) -> bool {
    SKILL_VARIATIONS
        .iter()
        .any(|group| group.contains(&left) && group.contains(&right))
}

/// Whether two normalized skills name the same thing.
///
/// Substring matching only applies to tokens longer than three characters with similar
/// lengths, so "java" never matches "javascript".
fn normalized_match(candidate: &str, required: &str) -> bool {
    if candidate.is_empty() || required.is_empty() {
        return false;
    }
    if candidate == required || same_variation(candidate, required) {
        return true;
    }
    candidate.len() > 3
        && required.len() > 3
        && (candidate.contains(required) || required.contains(candidate))
        && candidate.len().abs_diff(required.len()) <= 4
}

/// Count how many of `required` are covered by `candidate`. Returns `(matched, required_len)`.
pub(crate) fn match_skills<C, R>(candidate: &[C], required: &[R]) -> (usize, usize)
where
    C: AsRef<str>,
    R: AsRef<str>,
{
    if required.is_empty() {
        return (0, 0);
    }

    let candidate: Vec<String> = candidate.iter().map(|s| normalize_skill(s.as_ref())).collect();
    let matched = required
        .iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|req| candidate.iter().any(|cand| normalized_match(cand, req)))
        .count();

    (matched, required.len())
}

/// Loose containment check used for coherence signals between CV sections.
pub(crate) fn loosely_related(left: &str, right: &str) -> bool {
    let left = normalize_skill(left);
    let right = normalize_skill(right);
    !left.is_empty() && !right.is_empty() && (left.contains(&right) || right.contains(&left))
}

/// Share of `items` loosely related to at least one entry of `pool`.
pub(crate) fn coverage_ratio(items: &[&str], pool: &[&str]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let covered = items
        .iter()
        .filter(|item| pool.iter().any(|other| loosely_related(item, other)))
        .count();
    covered as f64 / items.len() as f64
}
