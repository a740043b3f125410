//! ESPN position-id → display-name catalog.
//!
//! The analytic subsystems only ever emit numeric position ids; this mapping
//! exists for the presentation boundary (CLI tables, JSON rows).

/// Display name for an ESPN `defaultPositionId`.
pub fn position_name(position_id: u32) -> String {
    let name = match position_id {
        1 => "QB",
        2 => "RB",
        3 => "WR",
        4 => "TE",
        7 => "OP",
        8 => "DT",
        9 => "DE",
        10 => "LB",
        11 => "DL",
        12 => "CB",
        13 => "S",
        14 => "DB",
        15 => "DP",
        16 => "D/ST",
        17 => "K",
        18 => "P",
        19 => "HC",
        20 => "BE",
        21 => "IR",
        23 => "RB/WR/TE",
        _ => return format!("POS{position_id}"),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_positions() {
        assert_eq!(position_name(1), "QB");
        assert_eq!(position_name(2), "RB");
        assert_eq!(position_name(16), "D/ST");
        assert_eq!(position_name(17), "K");
    }

    #[test]
    fn test_unknown_position_falls_back_to_id() {
        assert_eq!(position_name(99), "POS99");
    }
}
