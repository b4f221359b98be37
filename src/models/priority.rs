//! Priority is derived from the risk score, never predicted, so it cannot
//! contradict the risk the client sees.

/// Map a risk score in `[0, 100]` to a priority in `1..=5`.
pub fn priority_for_risk(risk: u8) -> u8 {
    match risk {
        80.. => 5,
        65..=79 => 4,
        45..=64 => 3,
        25..=44 => 2,
        _ => 1,
    }
}
