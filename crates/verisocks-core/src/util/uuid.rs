//! Canonical 8-4-4-4-12 transaction UUID formatting, per `spec.md` §3.

use uuid::Uuid;

#[allow(dead_code)]
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

#[allow(dead_code)]
pub fn parse(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s).ok()
}

#[allow(dead_code)]
pub fn format(id: Uuid) -> String {
    id.hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_canonical_form() {
        let id = generate();
        let s = format(id);
        assert_eq!(s.len(), 36);
        assert_eq!(parse(&s), Some(id));
    }
}
