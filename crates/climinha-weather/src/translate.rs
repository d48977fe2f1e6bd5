//! Portuguese labels for OpenWeatherMap condition descriptions.

/// Translate a raw provider description.
///
/// Exact, case-sensitive match against the known phrases; anything else is
/// returned unchanged.
pub fn translate_condition(raw: &str) -> &str {
    match raw {
        "clear sky" => "Céu limpo",
        "few clouds" => "Poucas nuvens",
        "scattered clouds" => "Nuvens dispersas",
        "broken clouds" => "Nuvens fragmentadas",
        "shower rain" => "Chuva rápida",
        "rain" => "Chuva",
        "thunderstorm" => "Tempestade",
        "snow" => "Neve",
        "mist" => "Névoa",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_conditions() {
        assert_eq!(translate_condition("clear sky"), "Céu limpo");
        assert_eq!(translate_condition("few clouds"), "Poucas nuvens");
        assert_eq!(translate_condition("scattered clouds"), "Nuvens dispersas");
        assert_eq!(translate_condition("broken clouds"), "Nuvens fragmentadas");
        assert_eq!(translate_condition("shower rain"), "Chuva rápida");
        assert_eq!(translate_condition("rain"), "Chuva");
        assert_eq!(translate_condition("thunderstorm"), "Tempestade");
        assert_eq!(translate_condition("snow"), "Neve");
        assert_eq!(translate_condition("mist"), "Névoa");
    }

    #[test]
    fn test_unknown_condition_passes_through() {
        assert_eq!(translate_condition("foggy night"), "foggy night");
        assert_eq!(translate_condition(""), "");
    }

    #[test]
    fn test_match_is_exact() {
        assert_eq!(translate_condition("Clear sky"), "Clear sky");
        assert_eq!(translate_condition("rain "), "rain ");
        assert_eq!(translate_condition("light rain"), "light rain");
    }
}
