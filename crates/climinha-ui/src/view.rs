//! Text rendering of [`AppState`].

use chrono::Local;
use climinha_weather::translate_condition;

use crate::models::AppState;

pub const FETCH_BUTTON: &str = "[Buscar Clima]";

/// Render the whole panel. One widget per line.
pub fn render(state: &AppState) -> String {
    let mut lines = vec![state.title.clone(), String::new()];

    if let Some(place) = &state.place_name {
        lines.push(format!("Localização Atual: {}", place));
    }

    if state.fetch_state.is_loading() {
        lines.push("Carregando...".to_string());
    } else if let Some(reading) = &state.reading {
        lines.push(format!("Temperatura: {}°C", reading.temperature_celsius));
        lines.push(format!(
            "Condição: {}",
            translate_condition(&reading.condition_description)
        ));
        lines.push(format!("Vento: {} m/s", reading.wind_speed_mps));
        lines.push(format!(
            "Atualizado às {}",
            reading.fetched_at.with_timezone(&Local).format("%H:%M")
        ));
    } else {
        lines.push("Buscando dados...".to_string());
    }

    lines.push(String::new());
    if state.fetch_enabled() {
        lines.push(FETCH_BUTTON.to_string());
    } else {
        lines.push(format!("{} (aguarde)", FETCH_BUTTON));
    }

    if let Some(notice) = &state.notice {
        lines.push(String::new());
        lines.push(format!("! {}: {}", notice.title, notice.message));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Notice;
    use chrono::Utc;
    use climinha_weather::{FetchState, Position, WeatherReading};

    fn state() -> AppState {
        AppState {
            title: "Climinha".to_string(),
            position: None,
            place_name: None,
            reading: None,
            fetch_state: FetchState::Idle,
            notice: None,
        }
    }

    fn reading() -> WeatherReading {
        WeatherReading {
            temperature_celsius: 21.5,
            condition_description: "rain".to_string(),
            wind_speed_mps: 3.2,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn placeholder_before_first_fetch() {
        let out = render(&state());
        assert!(out.starts_with("Climinha"));
        assert!(out.contains("Buscando dados..."));
        assert!(!out.contains("Localização Atual"));
        assert!(out.contains(FETCH_BUTTON));
        assert!(!out.contains("aguarde"));
    }

    #[test]
    fn weather_panel_translates_condition() {
        let s = AppState {
            position: Some(Position::new(10.0, 20.0)),
            place_name: Some("Springfield".to_string()),
            reading: Some(reading()),
            fetch_state: FetchState::Loaded,
            ..state()
        };

        let out = render(&s);

        assert!(out.contains("Localização Atual: Springfield"));
        assert!(out.contains("Temperatura: 21.5°C"));
        assert!(out.contains("Condição: Chuva"));
        assert!(out.contains("Vento: 3.2 m/s"));
    }

    #[test]
    fn loading_hides_panel_and_disables_trigger() {
        let s = AppState {
            reading: Some(reading()),
            fetch_state: FetchState::Loading,
            ..state()
        };

        let out = render(&s);

        assert!(out.contains("Carregando..."));
        assert!(!out.contains("Temperatura"));
        assert!(out.contains("[Buscar Clima] (aguarde)"));
    }

    #[test]
    fn failed_fetch_keeps_previous_reading() {
        let s = AppState {
            reading: Some(reading()),
            fetch_state: FetchState::Failed,
            notice: Some(Notice {
                title: "Erro".to_string(),
                message: "Não foi possível obter os dados do clima".to_string(),
            }),
            ..state()
        };

        let out = render(&s);

        assert!(out.contains("Temperatura: 21.5°C"));
        assert!(out.contains("! Erro: Não foi possível obter os dados do clima"));
    }
}
