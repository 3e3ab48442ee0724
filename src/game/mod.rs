use crate::configuration::GameConfig;
use rand::Rng;

/// Draws a random size change. The sign comes from a luck-weighted coin
/// flip; the magnitude is uniform over the chosen branch, zero excluded.
pub fn compute_delta(config: &GameConfig) -> i64 {
    let mut rng = rand::rng();
    if rng.random_bool(config.positive_probability()) {
        rng.random_range(1..=config.max_change)
    } else {
        rng.random_range(config.min_change..=-1)
    }
}

/// Applies `delta` to `current`, clamping the result to the configured
/// bounds. Returns the new value and the change that actually happened,
/// which may be 0 when the value already sits at a boundary.
pub fn apply_delta(config: &GameConfig, current: i64, delta: i64) -> (i64, i64) {
    let new_value = current + delta;
    if new_value < config.min_size {
        (config.min_size, config.min_size - current)
    } else if new_value > config.max_size {
        (config.max_size, config.max_size - current)
    } else {
        (new_value, delta)
    }
}

pub fn describe_value(value: i64) -> &'static str {
    if value <= -80 {
        "microscopic"
    } else if value <= -60 {
        "tiny"
    } else if value <= -40 {
        "small"
    } else if value <= -20 {
        "below average"
    } else if value <= 0 {
        "average"
    } else if value <= 20 {
        "decent"
    } else if value <= 40 {
        "big"
    } else if value <= 60 {
        "very big"
    } else if value <= 80 {
        "huge"
    } else {
        "absolutely massive"
    }
}

/// Phrase for a single change, used in history listings.
pub fn describe_delta(delta: i64) -> String {
    let magnitude = delta.abs();
    let unit = if magnitude == 1 { "point" } else { "points" };
    let emoji = emoji_for_delta(delta);
    let verb = if delta > 0 { "grew" } else { "shrank" };
    if magnitude >= 5 {
        format!("{} by {} {}! {}", verb, magnitude, unit, emoji)
    } else {
        format!("{} by {} {} {}", verb, magnitude, unit, emoji)
    }
}

pub fn emoji_for_value(value: i64) -> &'static str {
    if value <= -60 {
        "🫤"
    } else if value <= -20 {
        "😐"
    } else if value <= 20 {
        "😊"
    } else if value <= 60 {
        "😍"
    } else {
        "🤩"
    }
}

pub fn emoji_for_delta(delta: i64) -> &'static str {
    let magnitude = delta.abs();
    if delta > 0 {
        if magnitude >= 8 {
            "🎉"
        } else if magnitude >= 5 {
            "😊"
        } else if magnitude >= 2 {
            "🙂"
        } else {
            "😌"
        }
    } else if magnitude >= 8 {
        "😱"
    } else if magnitude >= 5 {
        "😢"
    } else if magnitude >= 2 {
        "😕"
    } else {
        "😔"
    }
}
