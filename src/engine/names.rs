// Generic title detection and best-name selection

const TIMES_OF_DAY: [&str; 5] = ["morning", "afternoon", "evening", "night", "lunch"];
const GENERIC_NOUNS: [&str; 3] = ["cycling", "ride", "workout"];

/// Whether `name` is an auto-generated title that says nothing about the workout,
/// e.g. "Morning Ride" or just the activity type.
pub fn is_generic_name(name: &str, activity_type: &str) -> bool {
    let trimmed = name.trim().to_lowercase();
    if trimmed.is_empty() || trimmed == "untitled" {
        return true;
    }

    let low_type = activity_type.trim().to_lowercase();
    if trimmed == low_type || GENERIC_NOUNS.contains(&trimmed.as_str()) {
        return true;
    }

    // "{time} {type}", also "{time} ride" and "{time} workout" for any type
    TIMES_OF_DAY.iter().any(|time| {
        trimmed
            .strip_prefix(time)
            .and_then(|rest| rest.strip_prefix(' '))
            .is_some_and(|rest| rest == low_type || rest == "ride" || rest == "workout")
    })
}

/// Pick the most descriptive non-generic title among `names`.
/// Returns an empty string when every candidate is generic.
pub fn rank_candidate_names<S: AsRef<str>>(names: &[S], activity_type: &str) -> String {
    let mut best: Option<(f64, &str)> = None;

    for name in names.iter().map(AsRef::as_ref) {
        if is_generic_name(name, activity_type) {
            continue;
        }

        let score = name_desirability(name);
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, name));
        }
    }

    best.map(|(_, name)| name.to_string()).unwrap_or_default()
}

fn name_desirability(name: &str) -> f64 {
    let mut score = 1.0;

    // "Place - Landmark" titles are almost always written by hand
    if name.contains(" - ") {
        score += 100.0;
    }

    score += name.chars().count() as f64 * 0.1;

    let lower = name.to_lowercase();
    if TIMES_OF_DAY.iter().any(|time| lower.starts_with(time)) {
        score -= 10.0;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_generic_name() {
        let cases = [
            ("Morning Ride", "Cycling", true),
            ("Morning VirtualRide", "VirtualRide", true),
            ("Lunch Walk", "Walk", true),
            ("Afternoon Rowing", "Rowing", true),
            ("Evening Hike", "Hike", true),
            ("Night Workout", "Run", true),
            ("Cycling", "Cycling", true),
            ("Ride", "Run", true),
            ("Workout", "Cycling", true),
            ("Fox Creek Trails", "Cycling", false),
            ("Morning GravelRide", "Cycling", false),
            ("Ellisville - Weldon", "Cycling", false),
            ("Morning", "Cycling", false),
            ("Untitled", "Cycling", true),
            ("", "Cycling", true),
        ];

        for (name, activity_type, want) in cases {
            assert_eq!(
                is_generic_name(name, activity_type),
                want,
                "is_generic_name({name:?}, {activity_type:?})"
            );
        }
    }

    #[test]
    fn test_generic_name_ignores_case_and_whitespace() {
        for name in ["Morning Ride", "Untitled", "Fox Creek Trails", "cycling", ""] {
            let base = is_generic_name(name, "Cycling");
            assert_eq!(is_generic_name(&name.to_uppercase(), "Cycling"), base);
            assert_eq!(is_generic_name(&format!("  {name}\t"), "Cycling"), base);
        }
        assert!(is_generic_name("   ", "Cycling"));
    }

    #[test]
    fn test_rank_candidate_names() {
        let cases: [(&[&str], &str, &str); 4] = [
            (&["Morning Ride", "Ellisville - Weldon", "Cycling"], "Cycling", "Ellisville - Weldon"),
            (&["Morning Ride", "Morning GravelRide"], "Cycling", "Morning GravelRide"),
            (&["Lunch Walk", "Centaur - Pond"], "Walk", "Centaur - Pond"),
            (&["Morning Ride", "Cycling", ""], "Cycling", ""),
        ];

        for (names, activity_type, want) in cases {
            assert_eq!(rank_candidate_names(names, activity_type), want);
        }
    }

    #[test]
    fn test_rank_prefers_longer_titles_and_keeps_first_on_tie() {
        let names = ["Hill repeats", "Hill repeats x6 on Mount Tam"];
        assert_eq!(rank_candidate_names(&names, "Ride"), "Hill repeats x6 on Mount Tam");

        let tied = ["Loop A", "Loop B"];
        assert_eq!(rank_candidate_names(&tied, "Ride"), "Loop A");
    }

    #[test]
    fn test_time_of_day_prefix_penalty() {
        let morning = name_desirability("Morning spin with Sam");
        let plain = name_desirability("Xorning spin with Sam");
        assert!((plain - morning - 10.0).abs() < 1e-9);

        let landmark = name_desirability("Ellisville - Weldon");
        assert!((landmark - (1.0 + 100.0 + 19.0 * 0.1)).abs() < 1e-9);
    }
}
